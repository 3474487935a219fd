//! In-memory credential store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use authfetch_core::Result;
use authfetch_core::traits::{CredentialKey, CredentialStore, SessionTeardown};

/// A credential store that lives only as long as the process.
///
/// Cheap to clone; clones share the same credentials. Useful for tests and
/// for hosts that keep secrets elsewhere and only seed the client.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<HashMap<CredentialKey, String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds both credentials.
    pub fn with_tokens(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        let mut map = HashMap::new();
        map.insert(CredentialKey::AccessToken, access.into());
        map.insert(CredentialKey::RefreshToken, refresh.into());
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Number of stored credentials.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        Ok(self.inner.read().await.get(&key).cloned())
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.inner.write().await.insert(key, value.to_string());
        debug!(%key, "Stored credential in memory");
        Ok(())
    }

    async fn remove(&self, key: CredentialKey) -> Result<()> {
        self.inner.write().await.remove(&key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.inner.write().await.clear();
        Ok(())
    }
}

#[async_trait]
impl SessionTeardown for MemoryCredentialStore {
    async fn teardown(&self) -> Result<()> {
        self.clear().await?;
        debug!("Cleared in-memory session");
        Ok(())
    }
}

// Hide credential values in Debug output
impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("entries", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use authfetch_core::{AccessToken, RefreshToken};

    use super::*;

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryCredentialStore::new();
        let clone = store.clone();

        clone.set(CredentialKey::AccessToken, "T1").await.unwrap();

        assert_eq!(
            store.get(CredentialKey::AccessToken).await.unwrap().as_deref(),
            Some("T1")
        );
    }

    #[tokio::test]
    async fn typed_accessors() {
        let store = MemoryCredentialStore::new();
        store
            .store_tokens(&AccessToken::new("T1"), &RefreshToken::new("R1"))
            .await
            .unwrap();

        assert_eq!(
            store.access_token().await.unwrap(),
            Some(AccessToken::new("T1"))
        );
        assert_eq!(
            store.refresh_token().await.unwrap(),
            Some(RefreshToken::new("R1"))
        );
    }

    #[tokio::test]
    async fn teardown_empties_store() {
        let store = MemoryCredentialStore::with_tokens("T1", "R1");
        assert_eq!(store.len().await, 2);

        store.teardown().await.unwrap();

        assert!(store.is_empty().await);
    }

    #[test]
    fn debug_hides_values() {
        let store = MemoryCredentialStore::with_tokens("secret-access", "secret-refresh");
        let debug = format!("{:?}", store);
        assert!(!debug.contains("secret"));
    }
}
