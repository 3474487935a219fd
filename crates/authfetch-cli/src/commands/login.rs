//! Login command implementation.

use anyhow::{Context as _, Result};
use clap::Args;

use authfetch_core::traits::CredentialStore;
use authfetch_core::{AccessToken, RefreshToken};

use crate::context::Context;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Access token issued by the login endpoint
    #[arg(long)]
    pub access_token: String,

    /// Refresh token issued by the login endpoint
    #[arg(long)]
    pub refresh_token: String,
}

pub async fn run(ctx: &Context, args: LoginArgs) -> Result<()> {
    ctx.store
        .store_tokens(
            &AccessToken::new(args.access_token),
            &RefreshToken::new(args.refresh_token),
        )
        .await
        .context("Failed to save credentials")?;

    output::success("Credentials stored");
    output::field("Store", &ctx.store.path().display().to_string());

    Ok(())
}
