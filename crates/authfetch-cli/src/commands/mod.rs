//! Subcommand implementations.

pub mod login;
pub mod logout;
pub mod refresh;
pub mod request;
pub mod status;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::context::Context;

pub async fn handle(cli: Cli) -> Result<()> {
    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        Commands::Login(args) => login::run(&ctx, args).await,
        Commands::Status(args) => status::run(&ctx, args).await,
        Commands::Request(args) => request::run(&ctx, args).await,
        Commands::Refresh(args) => refresh::run(&ctx, args).await,
        Commands::Logout(args) => logout::run(&ctx, args).await,
    }
}
