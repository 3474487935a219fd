//! Shared state for commands: the credential store and the client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use directories::ProjectDirs;

use authfetch_core::traits::TracingTelemetry;
use authfetch_core::{BaseUrl, ClientConfig, Notice};
use authfetch_http::ApiClient;
use authfetch_store::FileCredentialStore;

use crate::cli::Cli;
use crate::output;

/// Resolved global options.
pub struct Context {
    base_url: Option<String>,
    timeout: Option<Duration>,
    pub store: FileCredentialStore,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let path = match &cli.store {
            Some(path) => path.clone(),
            None => default_store_path()?,
        };

        Ok(Self {
            base_url: cli.base_url.clone(),
            timeout: cli.timeout_ms.map(Duration::from_millis),
            store: FileCredentialStore::new(path),
        })
    }

    /// Build a client that prints notices to stderr.
    pub fn client(&self) -> Result<ApiClient> {
        let base_url = self
            .base_url
            .as_deref()
            .context("No base URL. Pass --base-url or set AUTHFETCH_BASE_URL.")?;
        let base_url = BaseUrl::new(base_url).context("Invalid base URL")?;

        let mut config = ClientConfig::new(base_url);
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        let store = Arc::new(self.store.clone());
        ApiClient::builder(config, store.clone())
            .teardown(store)
            .telemetry(Arc::new(TracingTelemetry))
            .notices(Arc::new(|notice: Notice| output::warning(notice.message())))
            .build()
            .context("Failed to build client")
    }
}

/// Get the default credential file path.
fn default_store_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "authfetch").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("credentials.json"))
}
