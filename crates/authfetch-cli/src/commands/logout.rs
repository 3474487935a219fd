//! Logout command implementation.

use anyhow::{Context as _, Result};
use clap::Args;

use authfetch_core::traits::SessionTeardown;

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(ctx: &Context, _args: LogoutArgs) -> Result<()> {
    ctx.store
        .teardown()
        .await
        .context("Failed to clear credentials")?;

    output::success("Logged out");

    Ok(())
}
