//! Local history cache
//!
//! A newest-first JSON array of entries under one key of the persisted store.
//! Writes within this process are serialized; two processes writing the same
//! store can still lose an update.

use chrono::{DateTime, Utc};
use common::store::KeyValueStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::error::HistoryResult;
use crate::models::{LocalEntry, WireEntry};

/// Store key holding the cached history
pub const HISTORY_KEY: &str = "ocr-history";

/// Default number of entries kept
pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Clone)]
pub struct LocalHistoryCache {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
    write_lock: Arc<Mutex<()>>,
}

impl LocalHistoryCache {
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read the cached entries
    ///
    /// An absent key, an unreadable store or a corrupt value all read as empty.
    pub async fn load(&self) -> Vec<WireEntry> {
        let raw = match self.store.get(HISTORY_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read local history: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<WireEntry>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Local history is corrupt, treating it as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Prepend a new entry and keep the newest `capacity` entries
    pub async fn prepend(
        &self,
        text: &str,
        file_name: &str,
        now: DateTime<Utc>,
    ) -> HistoryResult<LocalEntry> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await;

        let entry = LocalEntry {
            id: unique_id(&entries, now.timestamp_millis()),
            text: text.to_string(),
            file_name: Some(file_name.to_string()),
            timestamp: now.timestamp_millis(),
        };

        entries.insert(0, WireEntry::Local(entry.clone()));
        entries.truncate(self.capacity);

        let raw = serde_json::to_string(&entries)?;
        self.store.set(HISTORY_KEY, &raw).await?;

        debug!("Cached entry {} locally ({} kept)", entry.id, entries.len());
        Ok(entry)
    }

    /// Remove the cached history
    pub async fn clear(&self) -> HistoryResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store.delete(HISTORY_KEY).await?;
        Ok(())
    }
}

/// A millisecond id not already used by `entries`
fn unique_id(entries: &[WireEntry], millis: i64) -> String {
    let taken = |candidate: &str| {
        entries
            .iter()
            .any(|entry| matches!(entry, WireEntry::Local(local) if local.id == candidate))
    };

    let mut candidate = millis;
    while taken(&candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::store::MemoryStore;

    #[tokio::test]
    async fn test_prepend_keeps_newest_first() {
        let cache = LocalHistoryCache::new(Arc::new(MemoryStore::new()), 3);
        let now = Utc::now();

        for i in 0..5 {
            cache.prepend(&format!("text {i}"), "a.png", now).await.unwrap();
        }

        let texts: Vec<String> = cache
            .load()
            .await
            .into_iter()
            .map(|entry| match entry {
                WireEntry::Local(local) => local.text,
                WireEntry::Remote(_) => unreachable!(),
            })
            .collect();
        assert_eq!(texts, vec!["text 4", "text 3", "text 2"]);
    }

    #[tokio::test]
    async fn test_ids_are_unique_within_one_millisecond() {
        let cache = LocalHistoryCache::new(Arc::new(MemoryStore::new()), DEFAULT_CAPACITY);
        let now = Utc::now();

        let first = cache.prepend("a", "a.png", now).await.unwrap();
        let second = cache.prepend("b", "b.png", now).await.unwrap();

        assert_eq!(first.id, now.timestamp_millis().to_string());
        assert_ne!(first.id, second.id);
        assert_eq!(first.timestamp, second.timestamp);
    }

    #[tokio::test]
    async fn test_corrupt_cache_reads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, "[{\"broken\"").await.unwrap();

        let cache = LocalHistoryCache::new(store.clone(), DEFAULT_CAPACITY);
        assert!(cache.load().await.is_empty());

        // and can be written over
        cache.prepend("fresh", "a.png", Utc::now()).await.unwrap();
        assert_eq!(cache.load().await.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_removes_key() {
        let store = Arc::new(MemoryStore::new());
        let cache = LocalHistoryCache::new(store.clone(), DEFAULT_CAPACITY);
        cache.prepend("x", "a.png", Utc::now()).await.unwrap();

        cache.clear().await.unwrap();
        assert_eq!(store.get(HISTORY_KEY).await.unwrap(), None);
    }
}
