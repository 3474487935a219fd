//! Status command implementation.

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use authfetch_core::traits::CredentialKey;

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status as JSON
    #[arg(long)]
    pub json: bool,
}

/// What is known about one stored credential. Values are never printed.
#[derive(Debug, Serialize)]
struct CredentialStatus {
    key: &'static str,
    stored: bool,
    updated_at: Option<DateTime<Utc>>,
}

pub async fn run(ctx: &Context, args: StatusArgs) -> Result<()> {
    let mut statuses = Vec::new();
    for key in CredentialKey::ALL {
        let entry = ctx
            .store
            .entry(key)
            .with_context(|| format!("Failed to read {}", key))?;
        statuses.push(CredentialStatus {
            key: key.as_str(),
            stored: entry.is_some(),
            updated_at: entry.map(|e| e.updated_at),
        });
    }

    if args.json {
        return output::json(&statuses);
    }

    output::field("Store", &ctx.store.path().display().to_string());
    for status in &statuses {
        let value = match status.updated_at {
            Some(at) => format!("stored (updated {})", at.to_rfc3339()),
            None => "missing".to_string(),
        };
        output::field(status.key, &value);
    }

    Ok(())
}
