//! Request command implementation.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use colored::Colorize;

use authfetch_http::{ApiRequest, Method, Outcome};

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method
    pub method: String,

    /// Path relative to the base URL, or an absolute URL
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(ctx: &Context, args: RequestArgs) -> Result<()> {
    let client = ctx.client()?;

    let method = args
        .method
        .to_ascii_uppercase()
        .parse::<Method>()
        .with_context(|| format!("Invalid HTTP method '{}'", args.method))?;
    let mut request = ApiRequest::new(method, &args.path);

    if let Some(data) = &args.data {
        let body: serde_json::Value =
            serde_json::from_str(data).context("Request body is not valid JSON")?;
        request = request.json(&body)?;
    }

    let response = match client.send(request).await.context("Request failed")? {
        Outcome::Response(response) => response,
        Outcome::Suppressed(notice) => bail!("Request abandoned: {}", notice),
    };

    eprintln!("{}", format!("HTTP {}", response.status).dimmed());

    if response.body.is_empty() {
        return Ok(());
    }

    match response.json::<serde_json::Value>() {
        Ok(value) if args.pretty => output::json_pretty(&value)?,
        Ok(value) => output::json(&value)?,
        Err(_) => println!("{}", response.text()),
    }

    Ok(())
}
