//! Credential storage trait.

use std::fmt;

use async_trait::async_trait;

use crate::tokens::{AccessToken, RefreshToken};
use crate::Result;

/// Name under which a credential is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
}

impl CredentialKey {
    /// Every key the client reads or writes.
    pub const ALL: [CredentialKey; 2] = [CredentialKey::AccessToken, CredentialKey::RefreshToken];

    /// The storage name of this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "accessToken",
            CredentialKey::RefreshToken => "refreshToken",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable key-value storage for the two session credentials.
///
/// At most one value is stored per key; `set` replaces.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a credential, `None` if absent.
    async fn get(&self, key: CredentialKey) -> Result<Option<String>>;

    /// Store a credential, replacing any previous value.
    async fn set(&self, key: CredentialKey, value: &str) -> Result<()>;

    /// Remove a credential. Removing an absent key is not an error.
    async fn remove(&self, key: CredentialKey) -> Result<()>;

    /// Remove every credential.
    async fn clear(&self) -> Result<()> {
        for key in CredentialKey::ALL {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Read the access credential.
    async fn access_token(&self) -> Result<Option<AccessToken>> {
        Ok(self
            .get(CredentialKey::AccessToken)
            .await?
            .map(AccessToken::new))
    }

    /// Read the refresh credential.
    async fn refresh_token(&self) -> Result<Option<RefreshToken>> {
        Ok(self
            .get(CredentialKey::RefreshToken)
            .await?
            .map(RefreshToken::new))
    }

    /// Store both credentials after a login.
    async fn store_tokens(&self, access: &AccessToken, refresh: &RefreshToken) -> Result<()> {
        self.set(CredentialKey::AccessToken, access.as_str()).await?;
        self.set(CredentialKey::RefreshToken, refresh.as_str())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names() {
        assert_eq!(CredentialKey::AccessToken.as_str(), "accessToken");
        assert_eq!(CredentialKey::RefreshToken.to_string(), "refreshToken");
    }
}
