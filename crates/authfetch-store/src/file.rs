//! File-backed credential store.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use authfetch_core::Result;
use authfetch_core::error::{Error, StorageError};
use authfetch_core::traits::{CredentialKey, CredentialStore, SessionTeardown};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

fn map_io(path: &Path, err: std::io::Error) -> Error {
    Error::Storage(StorageError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

fn map_json(path: &Path, err: serde_json::Error) -> Error {
    Error::Storage(StorageError::Corrupt {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// A persisted credential and when it was last written.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

// Hide credential value in Debug output
impl std::fmt::Debug for StoredEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredEntry")
            .field("value", &"[REDACTED]")
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// On-disk layout: one JSON object keyed by credential name.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    entries: BTreeMap<String, StoredEntry>,
}

/// Credentials persisted as a single JSON file.
///
/// Writes take an exclusive advisory lock on a sibling `.lock` file and
/// atomically replace the credential file, so several processes can share
/// one store. On Unix the file is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the file at `path`. Nothing is touched on disk
    /// until the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the credential file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Read the stored entry for a key, including its timestamp.
    pub fn entry(&self, key: CredentialKey) -> Result<Option<StoredEntry>> {
        let file = self.read_file()?;
        Ok(file.entries.get(key.as_str()).cloned())
    }

    fn read_file(&self) -> Result<CredentialFile> {
        if !self.path.exists() {
            return Ok(CredentialFile::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| map_io(&self.path, e))?;
        if content.trim().is_empty() {
            return Ok(CredentialFile::default());
        }

        serde_json::from_str(&content).map_err(|e| map_json(&self.path, e))
    }

    fn write_file(&self, file: &CredentialFile) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| map_io(dir, e))?;

        let content = serde_json::to_string_pretty(file).map_err(|e| map_json(&self.path, e))?;

        let tmp_path = dir.join(format!(".credentials-{}.tmp", Uuid::new_v4().simple()));
        {
            let mut tmp = OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&tmp_path)
                .map_err(|e| map_io(&tmp_path, e))?;

            #[cfg(unix)]
            {
                let mut perms = tmp.metadata().map_err(|e| map_io(&tmp_path, e))?.permissions();
                perms.set_mode(0o600);
                fs::set_permissions(&tmp_path, perms).map_err(|e| map_io(&tmp_path, e))?;
            }

            tmp.write_all(content.as_bytes())
                .map_err(|e| map_io(&tmp_path, e))?;
            tmp.sync_data().map_err(|e| map_io(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            map_io(&self.path, e)
        })
    }

    /// Run a read-modify-write cycle under the exclusive file lock.
    fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut CredentialFile),
    {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| map_io(parent, e))?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| map_io(&lock_path, e))?;

        lock_file
            .lock_exclusive()
            .map_err(|e| map_io(&lock_path, e))?;

        let result = self.read_file().and_then(|mut file| {
            mutate(&mut file);
            self.write_file(&file)
        });

        lock_file.unlock().map_err(|e| map_io(&lock_path, e))?;

        result
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>> {
        Ok(self.entry(key)?.map(|entry| entry.value))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.update(|file| {
            file.entries.insert(
                key.as_str().to_string(),
                StoredEntry {
                    value: value.to_string(),
                    updated_at: Utc::now(),
                },
            );
        })?;
        debug!(%key, "Stored credential");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn remove(&self, key: CredentialKey) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|file| {
            file.entries.remove(key.as_str());
        })?;
        debug!(%key, "Removed credential");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|file| file.entries.clear())
    }
}

#[async_trait]
impl SessionTeardown for FileCredentialStore {
    async fn teardown(&self) -> Result<()> {
        self.clear().await?;
        info!(path = %self.path.display(), "Cleared persisted session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path().join("session").join("credentials.json"))
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.get(CredentialKey::AccessToken).await.unwrap().is_none());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set(CredentialKey::AccessToken, "T1").await.unwrap();
        store.set(CredentialKey::RefreshToken, "R1").await.unwrap();
        store.set(CredentialKey::AccessToken, "T2").await.unwrap();

        assert_eq!(
            store.get(CredentialKey::AccessToken).await.unwrap().as_deref(),
            Some("T2")
        );
        assert_eq!(
            store.get(CredentialKey::RefreshToken).await.unwrap().as_deref(),
            Some("R1")
        );
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        store_in(&dir)
            .set(CredentialKey::RefreshToken, "R1")
            .await
            .unwrap();

        let reopened = store_in(&dir);
        let entry = reopened.entry(CredentialKey::RefreshToken).unwrap().unwrap();
        assert_eq!(entry.value, "R1");
        assert!(entry.updated_at <= Utc::now());
    }

    #[tokio::test]
    async fn uses_storage_key_names_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set(CredentialKey::AccessToken, "T1").await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["entries"]["accessToken"]["value"], "T1");
    }

    #[tokio::test]
    async fn teardown_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set(CredentialKey::AccessToken, "T1").await.unwrap();
        store.set(CredentialKey::RefreshToken, "R1").await.unwrap();

        store.teardown().await.unwrap();

        assert!(store.get(CredentialKey::AccessToken).await.unwrap().is_none());
        assert!(store.get(CredentialKey::RefreshToken).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_on_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.remove(CredentialKey::AccessToken).await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileCredentialStore::new(&path);
        let err = store.get(CredentialKey::AccessToken).await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Corrupt { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_is_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set(CredentialKey::AccessToken, "T1").await.unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn entry_debug_hides_value() {
        let entry = StoredEntry {
            value: "secret-token".to_string(),
            updated_at: Utc::now(),
        };
        assert!(!format!("{:?}", entry).contains("secret-token"));
    }
}
