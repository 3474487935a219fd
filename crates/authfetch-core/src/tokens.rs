//! Bearer credential types.

use std::fmt;

/// A short-lived access credential sent with every API request.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value.
    ///
    /// # Security
    ///
    /// Use only when constructing authorization headers or persisting the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for this token.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A longer-lived refresh credential, used only to mint a new access token.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token value.
    ///
    /// # Security
    ///
    /// Use only when constructing refresh requests or persisting the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `Authorization` header value for the refresh exchange.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}
