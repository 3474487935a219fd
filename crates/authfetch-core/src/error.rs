//! Error types for authfetch.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, storage, and input validation errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for authfetch operations.
///
/// Conditions the client recovers from locally (a 400 or a 500 answered with
/// a notice) never surface here; everything that does is something the
/// caller has to deal with.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors raised by the refresh protocol.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Responses with a status the client does not handle itself.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Credential store failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (base URL, header values, request bodies).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if the session was torn down and the user has to log in again.
    pub fn is_session_terminated(&self) -> bool {
        matches!(self, Error::Auth(AuthError::SessionTerminated))
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol(err) => Some(err.status),
            Error::Auth(AuthError::RefreshRejected { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The refresh credential was refused and the session was torn down.
    #[error("session terminated, login required")]
    SessionTerminated,

    /// The refresh exchange failed with a status other than 201 or 401.
    #[error("refresh exchange rejected with HTTP {status}")]
    RefreshRejected { status: u16, body: String },

    /// The refresh exchange succeeded but its payload has the wrong shape.
    #[error("malformed refresh response: {reason}")]
    MalformedRefreshResponse { reason: String },
}

/// An unhandled HTTP status, carrying the response body for the caller.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body, lossily decoded.
    pub body: String,
    /// Error message from the server, if the body carried one.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error from a status and raw body.
    ///
    /// If the body is a JSON object with a string `message` field, that
    /// message is lifted out for display.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from));
        Self {
            status,
            body,
            message,
        }
    }
}

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem IO failed.
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    /// The persisted credential file could not be parsed or written.
    #[error("corrupt credential file {path}: {message}")]
    Corrupt { path: String, message: String },

    /// Any other backend failure.
    #[error("{message}")]
    Backend { message: String },
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// A value cannot be carried in an HTTP header.
    #[error("invalid value for header '{name}'")]
    HeaderValue { name: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_lifts_json_message() {
        let err = ProtocolError::new(404, r#"{"message":"no such user"}"#);
        assert_eq!(err.message.as_deref(), Some("no such user"));
        assert_eq!(err.to_string(), "HTTP 404: no such user");
    }

    #[test]
    fn protocol_error_plain_body() {
        let err = ProtocolError::new(503, "Service Unavailable");
        assert!(err.message.is_none());
        assert_eq!(err.to_string(), "HTTP 503");
        assert_eq!(err.body, "Service Unavailable");
    }

    #[test]
    fn status_accessor() {
        let err = Error::from(ProtocolError::new(409, ""));
        assert_eq!(err.status(), Some(409));

        let err = Error::from(AuthError::RefreshRejected {
            status: 403,
            body: String::new(),
        });
        assert_eq!(err.status(), Some(403));

        assert_eq!(Error::from(AuthError::SessionTerminated).status(), None);
    }

    #[test]
    fn session_terminated_predicate() {
        assert!(Error::from(AuthError::SessionTerminated).is_session_terminated());
        assert!(!Error::from(ProtocolError::new(401, "")).is_session_terminated());
    }
}
