//! Side-effect hooks: session teardown, telemetry, and user notices.

use async_trait::async_trait;
use tracing::{error, warn};

use crate::notice::Notice;
use crate::Result;

/// Clears all locally persisted identity state.
#[async_trait]
pub trait SessionTeardown: Send + Sync {
    async fn teardown(&self) -> Result<()>;
}

/// Fire-and-forget crash/telemetry collector.
pub trait Telemetry: Send + Sync {
    fn capture_message(&self, message: &str);
}

/// Receives user-visible notices. The host decides how to present them.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl<F> NoticeSink for F
where
    F: Fn(Notice) + Send + Sync,
{
    fn notify(&self, notice: Notice) {
        self(notice)
    }
}

/// Telemetry that records messages as `tracing` error events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn capture_message(&self, message: &str) {
        error!(target: "authfetch::telemetry", text = message, "captured message");
    }
}

/// Notice sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn notify(&self, notice: Notice) {
        warn!(?notice, text = notice.message(), "user notice");
    }
}
