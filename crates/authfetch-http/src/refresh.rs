//! Access token refresh and replay.

use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, error, info, instrument, warn};

use authfetch_core::error::AuthError;
use authfetch_core::traits::CredentialKey;
use authfetch_core::{AccessToken, Notice, Result};

use crate::client::ApiClient;
use crate::request::{ApiRequest, ApiResponse, header_value};

/// Response body of a successful refresh exchange.
#[derive(Deserialize)]
struct RefreshResponse {
    data: RefreshData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshData {
    access_token: String,
}

/// What the refresh endpoint made of the refresh token.
enum Exchange {
    Refreshed(AccessToken),
    Refused,
}

/// Snapshot of the refresh gate, taken when a request is stamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Epoch {
    generation: u64,
    terminated: bool,
}

/// Serializes refresh exchanges.
///
/// Only 401 handling takes the exchange lock. Every completed refresh cycle
/// (new token or teardown) publishes a new generation, which requests read
/// without locking when they are stamped.
#[derive(Debug)]
pub(crate) struct RefreshGate {
    epoch: watch::Sender<Epoch>,
    exchange: Mutex<()>,
    terminating: AtomicBool,
}

impl Default for RefreshGate {
    fn default() -> Self {
        let (epoch, _) = watch::channel(Epoch::default());
        Self {
            epoch,
            exchange: Mutex::new(()),
            terminating: AtomicBool::new(false),
        }
    }
}

impl RefreshGate {
    pub(crate) fn epoch(&self) -> Epoch {
        *self.epoch.borrow()
    }

    fn is_terminating(&self) -> bool {
        self.terminating.load(Ordering::Acquire)
    }

    fn publish(&self, terminated: bool) {
        self.epoch.send_modify(|epoch| {
            epoch.generation += 1;
            epoch.terminated = terminated;
        });
    }
}

/// Marks a teardown in progress. Dropping it publishes the terminated
/// generation and clears the mark, even if the teardown future is cancelled.
struct Terminating<'a>(&'a RefreshGate);

impl<'a> Terminating<'a> {
    fn begin(gate: &'a RefreshGate) -> Self {
        gate.terminating.store(true, Ordering::Release);
        Self(gate)
    }
}

impl Drop for Terminating<'_> {
    fn drop(&mut self) {
        self.0.publish(true);
        self.0.terminating.store(false, Ordering::Release);
    }
}

impl ApiClient {
    /// Refresh the access token now, without replaying anything.
    ///
    /// # Errors
    ///
    /// Same as the refresh path of [`ApiClient::send`]; a refused refresh
    /// token tears the session down and yields `SessionTerminated`.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<AccessToken> {
        let gate = &self.inner.gate;
        if gate.is_terminating() {
            return Err(AuthError::SessionTerminated.into());
        }
        let guard = gate.exchange.lock().await;
        self.run_exchange(guard).await
    }

    /// Handle a 401 to `request`, which was stamped under `seen`.
    #[instrument(skip(self, request, seen), fields(method = %request.method, url = %request.url))]
    pub(crate) async fn refresh_and_retry(
        &self,
        mut request: ApiRequest,
        seen: Epoch,
    ) -> Result<ApiResponse> {
        let gate = &self.inner.gate;
        if gate.is_terminating() {
            debug!("Unauthorized while the session is being torn down");
            return Err(AuthError::SessionTerminated.into());
        }

        let guard = gate.exchange.lock().await;
        if gate.is_terminating() {
            debug!("Unauthorized while the session is being torn down");
            return Err(AuthError::SessionTerminated.into());
        }

        if let Some(current) = self.inner.store.access_token().await? {
            let bearer = current.bearer();
            if request.authorization() != Some(bearer.as_str()) {
                drop(guard);
                debug!("Access token changed since the request was sent");
                request.set_authorization(&bearer)?;
                return self.replay(request).await;
            }
        }

        let epoch = gate.epoch();
        if epoch.terminated && epoch.generation != seen.generation {
            debug!("Session already torn down by a concurrent request");
            return Err(AuthError::SessionTerminated.into());
        }

        let token = self.run_exchange(guard).await?;
        request.set_authorization(&token.bearer())?;
        self.replay(request).await
    }

    /// Run one exchange under the exchange lock and publish its outcome.
    ///
    /// Teardown runs after the lock is released, so a teardown that sends
    /// through this client does not wait on itself.
    async fn run_exchange(&self, guard: MutexGuard<'_, ()>) -> Result<AccessToken> {
        let gate = &self.inner.gate;
        match self.exchange().await? {
            Exchange::Refreshed(token) => {
                gate.publish(false);
                Ok(token)
            }
            Exchange::Refused => {
                let _terminating = Terminating::begin(gate);
                drop(guard);
                self.terminate_session().await;
                Err(AuthError::SessionTerminated.into())
            }
        }
    }

    /// Trade the stored refresh token for a new access token and persist it.
    async fn exchange(&self) -> Result<Exchange> {
        info!("Refreshing access token");

        let Some(refresh_token) = self.inner.store.refresh_token().await? else {
            warn!("No refresh token stored");
            return Ok(Exchange::Refused);
        };

        let mut authorization = header_value(&AUTHORIZATION, &refresh_token.bearer())?;
        authorization.set_sensitive(true);
        let content_type = header_value(&CONTENT_TYPE, &self.inner.config.content_type)?;

        let response = self
            .inner
            .http
            .post(self.inner.config.refresh_url())
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, content_type)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        debug!(status, "Refresh exchange response");

        match status {
            201 => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| self.transport_error(e))?;
                let parsed: RefreshResponse = serde_json::from_slice(&body).map_err(|e| {
                    AuthError::MalformedRefreshResponse {
                        reason: e.to_string(),
                    }
                })?;
                if parsed.data.access_token.is_empty() {
                    return Err(AuthError::MalformedRefreshResponse {
                        reason: "empty accessToken".to_string(),
                    }
                    .into());
                }

                let token = AccessToken::new(parsed.data.access_token);
                self.inner
                    .store
                    .set(CredentialKey::AccessToken, token.as_str())
                    .await?;
                info!("Access token refreshed");
                Ok(Exchange::Refreshed(token))
            }
            401 => {
                warn!("Refresh token refused");
                Ok(Exchange::Refused)
            }
            _ => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| self.transport_error(e))?;
                error!(status, %body, "Refresh exchange failed");
                Err(AuthError::RefreshRejected { status, body }.into())
            }
        }
    }

    /// Send a request once more, without classification.
    async fn replay(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = self.transmit(request).await?;
        if response.is_success() {
            debug!(status = response.status, "Replay succeeded");
            Ok(response)
        } else {
            warn!(status = response.status, "Replay failed");
            Err(response.into_error())
        }
    }

    async fn terminate_session(&self) {
        if let Err(e) = self.inner.teardown.teardown().await {
            error!(error = %e, "Session teardown failed");
        }
        self.inner.notices.notify(Notice::ReloginRequired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_refresh_payload() {
        let parsed: RefreshResponse =
            serde_json::from_str(r#"{"data":{"accessToken":"T2","extra":1},"status":201}"#)
                .unwrap();
        assert_eq!(parsed.data.access_token, "T2");
    }

    #[test]
    fn rejects_flat_payload() {
        assert!(serde_json::from_str::<RefreshResponse>(r#"{"accessToken":"T2"}"#).is_err());
    }

    #[test]
    fn gate_starts_at_generation_zero() {
        let gate = RefreshGate::default();
        assert_eq!(gate.epoch(), Epoch::default());
        assert!(!gate.is_terminating());
    }

    #[test]
    fn publish_advances_generation() {
        let gate = RefreshGate::default();
        gate.publish(false);
        assert_eq!(
            gate.epoch(),
            Epoch {
                generation: 1,
                terminated: false
            }
        );
    }

    #[test]
    fn terminating_mark_publishes_on_drop() {
        let gate = RefreshGate::default();
        {
            let _mark = Terminating::begin(&gate);
            assert!(gate.is_terminating());
            assert_eq!(gate.epoch(), Epoch::default());
        }
        assert!(!gate.is_terminating());
        assert!(gate.epoch().terminated);
        assert_eq!(gate.epoch().generation, 1);
    }
}
