//! authfetch-core - Core credential types, errors, and collaborator traits.
//!
//! The HTTP client in `authfetch-http` is built on top of the pieces defined
//! here: the two bearer credentials, the unified [`Error`], the explicit
//! [`ClientConfig`], and the traits through which the client talks to its
//! host (credential storage, session teardown, telemetry, notices).

pub mod config;
pub mod error;
pub mod notice;
pub mod tokens;
pub mod traits;
pub mod types;

pub use config::ClientConfig;
pub use error::Error;
pub use notice::Notice;
pub use tokens::{AccessToken, RefreshToken};
pub use traits::{
    CredentialKey, CredentialStore, LogNotices, NoticeSink, SessionTeardown, Telemetry,
    TracingTelemetry,
};
pub use types::BaseUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
