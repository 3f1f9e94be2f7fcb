//! History reconciliation between the backend and the local cache
//!
//! When a backend is configured it is authoritative; the local cache is read
//! only when the backend cannot answer. History is never visible without a
//! session.

use auth::SessionStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{HistoryError, HistoryResult};
use crate::local::LocalHistoryCache;
use crate::models::HistoryEntry;
use crate::remote::RemoteHistory;

/// Where history lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryMode {
    /// Backend first, local cache as fallback
    #[default]
    Hybrid,
    /// Local cache only; the backend is never queried
    LocalOnly,
}

/// Outcome of clearing history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearSummary {
    /// Remote documents deleted
    pub succeeded: Vec<i64>,
    /// Remote documents that could not be deleted, with the reason
    pub failed: Vec<(i64, String)>,
    /// Whether the local cache key was removed
    pub local_cleared: bool,
}

impl ClearSummary {
    /// True when every delete went through
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.local_cleared
    }
}

pub struct HistoryReconciler {
    sessions: SessionStore,
    remote: Option<Arc<dyn RemoteHistory>>,
    local: LocalHistoryCache,
    mode: HistoryMode,
    /// Entries last shown, with the email of the session they were shown to
    last_listing: Mutex<Option<(String, Vec<HistoryEntry>)>>,
}

impl HistoryReconciler {
    pub fn new(
        sessions: SessionStore,
        remote: Option<Arc<dyn RemoteHistory>>,
        local: LocalHistoryCache,
        mode: HistoryMode,
    ) -> Self {
        Self {
            sessions,
            remote,
            local,
            mode,
            last_listing: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    fn active_remote(&self) -> Option<&Arc<dyn RemoteHistory>> {
        match self.mode {
            HistoryMode::Hybrid => self.remote.as_ref(),
            HistoryMode::LocalOnly => None,
        }
    }

    /// Current history, newest first
    pub async fn list_history(&self) -> Vec<HistoryEntry> {
        let session = self.sessions.current().await;
        let entries = match session {
            Some(_) => self.fetch().await,
            None => {
                debug!("No session, history is hidden");
                Vec::new()
            }
        };

        *self.last_listing.lock().await = session.map(|record| (record.email, entries.clone()));
        entries
    }

    async fn fetch(&self) -> Vec<HistoryEntry> {
        if let Some(remote) = self.active_remote() {
            match remote.list().await {
                Ok(entries) => return entries.into_iter().map(HistoryEntry::from).collect(),
                Err(e) => info!("{}, using local history", e),
            }
        }

        self.local
            .load()
            .await
            .into_iter()
            .map(HistoryEntry::from)
            .collect()
    }

    /// Record a finished conversion
    ///
    /// In hybrid mode the backend stored it while running OCR, so nothing is
    /// written and `None` is returned.
    pub async fn record_entry(
        &self,
        text: &str,
        file_name: &str,
    ) -> HistoryResult<Option<HistoryEntry>> {
        if !self.sessions.is_signed_in().await {
            return Err(HistoryError::SignInRequired);
        }

        match self.mode {
            HistoryMode::Hybrid => {
                debug!("Backend keeps history, nothing to record locally");
                Ok(None)
            }
            HistoryMode::LocalOnly => self.append_local(text, file_name).await.map(Some),
        }
    }

    /// Write a conversion to the local cache
    pub async fn append_local(&self, text: &str, file_name: &str) -> HistoryResult<HistoryEntry> {
        if !self.sessions.is_signed_in().await {
            return Err(HistoryError::SignInRequired);
        }

        let entry = self.local.prepend(text, file_name, Utc::now()).await?;
        info!("Saved {} to local history", file_name);
        Ok(entry.into())
    }

    /// Delete every remote entry, then the local cache
    ///
    /// Each remote delete is attempted even if an earlier one failed.
    pub async fn clear_history(&self) -> ClearSummary {
        let entries = self.list_history().await;
        let mut summary = ClearSummary::default();

        if let Some(remote) = self.active_remote() {
            for id in entries.iter().filter_map(|entry| entry.id.remote()) {
                match remote.delete(id).await {
                    Ok(()) => summary.succeeded.push(id),
                    Err(e) => {
                        warn!("Failed to delete document {}: {}", id, e);
                        summary.failed.push((id, e.to_string()));
                    }
                }
            }
        }

        match self.local.clear().await {
            Ok(()) => summary.local_cleared = true,
            Err(e) => warn!("Failed to clear local history: {}", e),
        }

        *self.last_listing.lock().await = self
            .sessions
            .current()
            .await
            .map(|record| (record.email, Vec::new()));

        info!(
            "History cleared: {} deleted, {} failed",
            summary.succeeded.len(),
            summary.failed.len()
        );
        summary
    }

    /// Text of the entry with `identifier` in the last listing
    ///
    /// Lists history first when nothing has been listed for the current
    /// session yet. Without a session nothing is returned.
    pub async fn load_entry(&self, identifier: &str) -> Option<String> {
        let Some(session) = self.sessions.current().await else {
            *self.last_listing.lock().await = None;
            return None;
        };

        let cached = self.last_listing.lock().await.clone();
        let entries = match cached {
            Some((email, entries)) if email == session.email => entries,
            _ => self.list_history().await,
        };

        entries
            .into_iter()
            .find(|entry| entry.id.matches(identifier))
            .map(|entry| entry.extracted_text)
    }
}
