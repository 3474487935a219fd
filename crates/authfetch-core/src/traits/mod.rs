//! Traits for the collaborators the client depends on.

mod hooks;
mod store;

pub use hooks::{LogNotices, NoticeSink, SessionTeardown, Telemetry, TracingTelemetry};
pub use store::{CredentialKey, CredentialStore};
