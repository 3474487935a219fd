//! Refresh command implementation.

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(ctx: &Context, _args: RefreshArgs) -> Result<()> {
    let client = ctx.client()?;

    eprintln!("{}", "Refreshing access token...".dimmed());

    client
        .refresh()
        .await
        .context("Failed to refresh access token")?;

    output::success("Access token refreshed");

    Ok(())
}
