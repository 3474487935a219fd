//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::BaseUrl;

/// Default request timeout, applied to every call including the refresh exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default media type sent as `Content-Type`.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Default path of the refresh exchange endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/user/token";

/// Configuration for a single client instance.
///
/// Every client owns its configuration, so several isolated clients can
/// coexist in one process.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use authfetch_core::{BaseUrl, ClientConfig};
///
/// let config = ClientConfig::new(BaseUrl::new("https://api.example.com").unwrap())
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.refresh_path, "/user/token");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every request path is resolved against.
    pub base_url: BaseUrl,

    /// Client-wide request timeout.
    #[serde(
        rename = "timeout_ms",
        with = "duration_ms",
        default = "default_timeout"
    )]
    pub timeout: Duration,

    /// Media type sent as `Content-Type` on every request.
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Path of the refresh exchange endpoint.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

fn default_user_agent() -> String {
    concat!("authfetch/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ClientConfig {
    /// Create a configuration with default settings for the given base URL.
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            timeout: default_timeout(),
            content_type: default_content_type(),
            refresh_path: default_refresh_path(),
            user_agent: default_user_agent(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Full URL of the refresh exchange endpoint.
    pub fn refresh_url(&self) -> String {
        self.base_url.endpoint(&self.refresh_path)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseUrl {
        BaseUrl::new("https://api.example.com").unwrap()
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new(base());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.content_type, "application/json");
        assert_eq!(config.refresh_url(), "https://api.example.com/user/token");
        assert!(config.user_agent.starts_with("authfetch/"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"https://api.example.com","timeout_ms":2500}"#)
                .unwrap();
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.refresh_path, DEFAULT_REFRESH_PATH);
    }

    #[test]
    fn serializes_timeout_as_millis() {
        let config = ClientConfig::new(base()).with_timeout(Duration::from_secs(3));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["timeout_ms"], 3000);
    }

    #[test]
    fn custom_refresh_path() {
        let config = ClientConfig::new(base()).with_refresh_path("auth/refresh");
        assert_eq!(config.refresh_url(), "https://api.example.com/auth/refresh");
    }
}
