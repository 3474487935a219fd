//! The authenticated API client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, trace, warn};

use authfetch_core::error::{Error, TransportError};
use authfetch_core::traits::{
    CredentialStore, LogNotices, NoticeSink, SessionTeardown, Telemetry, TracingTelemetry,
};
use authfetch_core::{AccessToken, ClientConfig, Notice, RefreshToken, Result};

use crate::classify::{Classification, classify};
use crate::refresh::{Epoch, RefreshGate};
use crate::request::{ApiRequest, ApiResponse, header_value};

/// Message reported to telemetry when the server answers 500.
const SERVER_ERROR_MESSAGE: &str = "server error";

/// Result of a send that did not fail.
#[derive(Debug)]
pub enum Outcome {
    /// The server's response, possibly from a replay after a token refresh.
    Response(ApiResponse),
    /// The failure was handled locally and the user was shown this notice.
    Suppressed(Notice),
}

impl Outcome {
    /// The response, if the request was not suppressed.
    pub fn into_response(self) -> Option<ApiResponse> {
        match self {
            Outcome::Response(response) => Some(response),
            Outcome::Suppressed(_) => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Outcome::Suppressed(_))
    }
}

/// HTTP client that authenticates every request and refreshes expired
/// access tokens transparently.
///
/// Clients are cheap to clone (they use internal `Arc`) and are safe to
/// share across tasks. Concurrent 401s share a single refresh exchange.
///
/// # Example
///
/// ```no_run
/// use authfetch_core::{BaseUrl, ClientConfig};
/// use authfetch_http::{ApiClient, ApiRequest};
/// use authfetch_store::MemoryCredentialStore;
///
/// # async fn example() -> Result<(), authfetch_core::Error> {
/// let config = ClientConfig::new(BaseUrl::new("https://api.example.com")?);
/// let store = MemoryCredentialStore::with_tokens("access", "refresh");
/// let client = ApiClient::new(config, store)?;
///
/// if let Some(response) = client.send(ApiRequest::get("/user")).await?.into_response() {
///     println!("{}", response.text());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    pub(crate) http: reqwest::Client,
    pub(crate) store: Arc<dyn CredentialStore>,
    pub(crate) teardown: Arc<dyn SessionTeardown>,
    pub(crate) telemetry: Arc<dyn Telemetry>,
    pub(crate) notices: Arc<dyn NoticeSink>,
    pub(crate) gate: RefreshGate,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    teardown: Option<Arc<dyn SessionTeardown>>,
    telemetry: Option<Arc<dyn Telemetry>>,
    notices: Option<Arc<dyn NoticeSink>>,
}

impl ApiClientBuilder {
    /// Session teardown to run when the refresh token is refused.
    /// Defaults to clearing the credential store.
    pub fn teardown(mut self, teardown: Arc<dyn SessionTeardown>) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Telemetry collector. Defaults to [`TracingTelemetry`].
    pub fn telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Notice sink. Defaults to [`LogNotices`].
    pub fn notices(mut self, notices: Arc<dyn NoticeSink>) -> Self {
        self.notices = Some(notices);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn build(self) -> Result<ApiClient> {
        let http = reqwest::Client::builder()
            .user_agent(self.config.user_agent.clone())
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        let store = self.store;
        let teardown = self
            .teardown
            .unwrap_or_else(|| Arc::new(ClearStore(Arc::clone(&store))));

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                config: self.config,
                http,
                store,
                teardown,
                telemetry: self.telemetry.unwrap_or_else(|| Arc::new(TracingTelemetry)),
                notices: self.notices.unwrap_or_else(|| Arc::new(LogNotices)),
                gate: RefreshGate::default(),
            }),
        })
    }
}

/// Default teardown: forget every stored credential.
struct ClearStore(Arc<dyn CredentialStore>);

#[async_trait]
impl SessionTeardown for ClearStore {
    async fn teardown(&self) -> Result<()> {
        self.0.clear().await
    }
}

impl ApiClient {
    /// Create a client whose store also serves as the session teardown.
    pub fn new<S>(config: ClientConfig, store: S) -> Result<Self>
    where
        S: CredentialStore + SessionTeardown + 'static,
    {
        let store = Arc::new(store);
        Self::builder(config, store.clone()).teardown(store).build()
    }

    pub fn builder(config: ClientConfig, store: Arc<dyn CredentialStore>) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            store,
            teardown: None,
            telemetry: None,
            notices: None,
        }
    }

    /// Persist the credentials obtained from a login.
    pub async fn login(&self, access: &AccessToken, refresh: &RefreshToken) -> Result<()> {
        self.inner.store.store_tokens(access, refresh).await?;
        debug!("Stored login credentials");
        Ok(())
    }

    /// Tear the session down.
    pub async fn logout(&self) -> Result<()> {
        self.inner.teardown.teardown().await
    }

    /// Send a request.
    ///
    /// Returns the response for 2xx (including a successful replay after a
    /// token refresh) and [`Outcome::Suppressed`] for 400 and 500, which are
    /// answered with a notice instead of an error.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if no response was received
    /// - [`Error::Auth`] if the refresh exchange failed; `SessionTerminated`
    ///   means the session was torn down
    /// - [`Error::Protocol`] for any other status, or a failed replay
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn send(&self, request: ApiRequest) -> Result<Outcome> {
        let (request, epoch) = self.augment(request).await?;
        let response = self.transmit(request).await?;
        let status = response.status;

        match classify(status) {
            Classification::Success => {
                debug!(status, "Success response");
                Ok(Outcome::Response(response))
            }
            Classification::SessionExpired => {
                warn!(status, "Session expired");
                self.inner.notices.notify(Notice::SessionExpired);
                Ok(Outcome::Suppressed(Notice::SessionExpired))
            }
            Classification::Unauthorized if self.is_refresh_endpoint(&response.request) => {
                error!(status, "Refresh endpoint called directly and refused");
                Err(response.into_error())
            }
            Classification::Unauthorized => {
                debug!(status, "Access token rejected");
                self.refresh_and_retry(response.request, epoch)
                    .await
                    .map(Outcome::Response)
            }
            Classification::ServerError => {
                error!(status, "Server error");
                self.inner.telemetry.capture_message(SERVER_ERROR_MESSAGE);
                self.inner.notices.notify(Notice::SystemError);
                Ok(Outcome::Suppressed(Notice::SystemError))
            }
            Classification::Unhandled => {
                error!(status, body = %response.text(), "Unhandled response status");
                Err(response.into_error())
            }
        }
    }

    /// Send a request and decode a JSON body.
    ///
    /// Returns `None` if the request was suppressed.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Option<T>> {
        match self.send(request).await? {
            Outcome::Response(response) => response.json().map(Some),
            Outcome::Suppressed(_) => Ok(None),
        }
    }

    /// Stamp the configured content type and the current access token onto
    /// a request, returning the refresh epoch the token was read under.
    pub(crate) async fn augment(&self, mut request: ApiRequest) -> Result<(ApiRequest, Epoch)> {
        let epoch = self.inner.gate.epoch();
        let content_type = header_value(&CONTENT_TYPE, &self.inner.config.content_type)?;
        request.headers.insert(CONTENT_TYPE, content_type);

        match self.inner.store.access_token().await? {
            Some(token) => request.set_authorization(&token.bearer())?,
            None => {
                debug!("No access token stored, sending without Authorization");
                request.headers.remove(AUTHORIZATION);
            }
        }

        Ok((request, epoch))
    }

    /// Put a request on the wire and collect the full response.
    pub(crate) async fn transmit(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.inner.config.base_url.endpoint(&request.url);
        trace!(%url, "Transmitting request");

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?
            .to_vec();

        trace!(status, len = body.len(), "Response received");

        Ok(ApiResponse {
            status,
            headers,
            body,
            request,
        })
    }

    pub(crate) fn transport_error(&self, err: reqwest::Error) -> Error {
        let err = if err.is_timeout() {
            TransportError::Timeout {
                duration_ms: self.inner.config.timeout.as_millis() as u64,
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        };
        Error::Transport(err)
    }

    fn is_refresh_endpoint(&self, request: &ApiRequest) -> bool {
        let config = &self.inner.config;
        config.base_url.endpoint(&request.url) == config.refresh_url()
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use authfetch_core::BaseUrl;
    use authfetch_store::MemoryCredentialStore;

    use super::*;

    fn client(store: MemoryCredentialStore) -> ApiClient {
        let config = ClientConfig::new(BaseUrl::new("https://api.example.com").unwrap())
            .with_content_type("application/vnd.test+json");
        ApiClient::new(config, store).unwrap()
    }

    #[tokio::test]
    async fn augment_sets_headers_from_store() {
        let client = client(MemoryCredentialStore::with_tokens("T1", "R1"));

        let (request, _) = client.augment(ApiRequest::get("/me")).await.unwrap();

        assert_eq!(request.authorization(), Some("Bearer T1"));
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/vnd.test+json"
        );
    }

    #[tokio::test]
    async fn augment_reads_the_store_on_every_call() {
        let store = MemoryCredentialStore::with_tokens("T1", "R1");
        let client = client(store.clone());

        client.augment(ApiRequest::get("/me")).await.unwrap();
        client
            .login(&AccessToken::new("T2"), &RefreshToken::new("R2"))
            .await
            .unwrap();
        let (request, _) = client.augment(ApiRequest::get("/me")).await.unwrap();

        assert_eq!(request.authorization(), Some("Bearer T2"));
    }

    #[tokio::test]
    async fn augment_without_token_drops_authorization() {
        let client = client(MemoryCredentialStore::new());

        let mut request = ApiRequest::get("/me");
        request.set_authorization("Bearer stale").unwrap();
        let (request, _) = client.augment(request).await.unwrap();

        assert!(request.authorization().is_none());
    }

    #[tokio::test]
    async fn logout_clears_store() {
        let store = MemoryCredentialStore::with_tokens("T1", "R1");
        let client = client(store.clone());

        client.logout().await.unwrap();

        assert!(store.is_empty().await);
    }

    #[test]
    fn recognizes_refresh_endpoint() {
        let client = client(MemoryCredentialStore::new());
        assert!(client.is_refresh_endpoint(&ApiRequest::post("/user/token")));
        assert!(client.is_refresh_endpoint(&ApiRequest::post("user/token")));
        assert!(!client.is_refresh_endpoint(&ApiRequest::get("/user")));
    }

    #[test]
    fn debug_hides_tokens() {
        let client = client(MemoryCredentialStore::with_tokens("secret-a", "secret-r"));
        assert!(!format!("{:?}", client).contains("secret"));
    }
}
