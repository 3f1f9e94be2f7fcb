//! Persisted key-value stores
//!
//! The client keeps its session record and the local history cache in a small
//! string-to-string store, the same way a browser keeps them in local storage.
//! Values are opaque strings; callers serialize their own JSON.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// A string key-value store shared by the session store and the history cache
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set a key, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// In-process store, lost when the process exits
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON object in a file
///
/// The file is re-read on every operation so that two processes sharing the
/// same path observe each other's writes. Writes go to a sibling temporary
/// file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Create a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(StoreError::Corrupt),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let raw = serde_json::to_string_pretty(entries).map_err(StoreError::Corrupt)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Persisted {} keys to {}", entries.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.load().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_set_get_delete() -> StoreResult<()> {
        let store = MemoryStore::new();

        store.set("user", "alice").await?;
        assert_eq!(store.get("user").await?, Some("alice".to_string()));

        store.set("user", "bob").await?;
        assert_eq!(store.get("user").await?, Some("bob".to_string()));

        store.delete("user").await?;
        assert_eq!(store.get("user").await?, None);

        // Deleting twice is fine
        store.delete("user").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() -> StoreResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("state.json");

        let store = FileStore::new(&path);
        assert_eq!(store.get("ocr-history").await?, None);
        store.set("ocr-history", "[]").await?;
        store.set("user", "{}").await?;

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("ocr-history").await?, Some("[]".to_string()));
        assert_eq!(reopened.get("user").await?, Some("{}".to_string()));

        reopened.delete("user").await?;
        assert_eq!(store.get("user").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_reports_corruption() -> StoreResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json")?;

        let store = FileStore::new(&path);
        assert!(matches!(store.get("user").await, Err(StoreError::Corrupt(_))));
        Ok(())
    }
}
