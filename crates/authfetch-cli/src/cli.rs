//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{login, logout, refresh, request, status};

/// Authenticated API client with transparent token refresh.
#[derive(Parser, Debug)]
#[command(name = "authfetch")]
#[command(author, version = env!("AUTHFETCH_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// API base URL
    #[arg(long, env = "AUTHFETCH_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Credential file (defaults to the platform data directory)
    #[arg(long, env = "AUTHFETCH_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store the access and refresh tokens from a login
    Login(login::LoginArgs),

    /// Show which credentials are stored
    Status(status::StatusArgs),

    /// Send a request through the refreshing client
    Request(request::RequestArgs),

    /// Exchange the refresh token for a new access token now
    Refresh(refresh::RefreshArgs),

    /// Tear the session down
    Logout(logout::LogoutArgs),
}
