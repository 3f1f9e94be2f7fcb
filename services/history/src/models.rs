//! History entry models
//!
//! The backend and the local cache describe the same conversion with different
//! field names. [`WireEntry`] captures both shapes; [`HistoryEntry`] is the one
//! shape handed to callers.

use chrono::{DateTime, NaiveDateTime, Utc};
use common::ocr::UNTITLED;
use serde::{Deserialize, Serialize};
use std::fmt;

/// History item as served by `GET /api/history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub document_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

/// History item as kept in the local cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEntry {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
}

/// Either stored shape
///
/// Deserialization tries the remote shape first, so a record carrying a
/// `document_id` is remote even if it also has local fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireEntry {
    Remote(RemoteEntry),
    Local(LocalEntry),
}

/// Identifier of a history entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    /// Issued by the backend
    Remote(i64),
    /// Millisecond-derived id issued by the local cache
    Local(String),
}

impl EntryId {
    /// Match a user-supplied identifier: numerically against remote ids,
    /// literally against local ids
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        match self {
            EntryId::Remote(id) => identifier.parse::<i64>().is_ok_and(|n| n == *id),
            EntryId::Local(id) => id == identifier,
        }
    }

    pub fn remote(&self) -> Option<i64> {
        match self {
            EntryId::Remote(id) => Some(*id),
            EntryId::Local(_) => None,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Remote(id) => write!(f, "{id}"),
            EntryId::Local(id) => f.write_str(id),
        }
    }
}

/// When an entry was created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryTimestamp {
    /// Date-time string from the backend
    Iso(String),
    /// Epoch milliseconds from the local cache
    EpochMillis(i64),
}

impl EntryTimestamp {
    /// Interpret the timestamp as UTC
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            EntryTimestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
            EntryTimestamp::Iso(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                        .map(|naive| naive.and_utc())
                }),
        }
    }
}

impl fmt::Display for EntryTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.to_datetime()) {
            (EntryTimestamp::Iso(raw), _) => f.write_str(raw),
            (EntryTimestamp::EpochMillis(_), Some(dt)) => {
                write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
            }
            (EntryTimestamp::EpochMillis(ms), None) => write!(f, "{ms}"),
        }
    }
}

/// A past conversion, whichever source it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: EntryId,
    pub extracted_text: String,
    pub origin_file_name: String,
    pub created_at: EntryTimestamp,
}

impl HistoryEntry {
    /// First `max_chars` characters of the text, with an ellipsis when cut
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.extracted_text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

fn file_name_or_untitled(name: Option<String>) -> String {
    name.filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

impl From<RemoteEntry> for HistoryEntry {
    fn from(entry: RemoteEntry) -> Self {
        Self {
            id: EntryId::Remote(entry.document_id),
            extracted_text: entry.text.or(entry.extracted_text).unwrap_or_default(),
            origin_file_name: file_name_or_untitled(entry.file_name),
            created_at: EntryTimestamp::Iso(entry.uploaded_at.unwrap_or_default()),
        }
    }
}

impl From<LocalEntry> for HistoryEntry {
    fn from(entry: LocalEntry) -> Self {
        Self {
            id: EntryId::Local(entry.id),
            extracted_text: entry.text,
            origin_file_name: file_name_or_untitled(entry.file_name),
            created_at: EntryTimestamp::EpochMillis(entry.timestamp),
        }
    }
}

impl From<WireEntry> for HistoryEntry {
    fn from(entry: WireEntry) -> Self {
        match entry {
            WireEntry::Remote(remote) => remote.into(),
            WireEntry::Local(local) => local.into(),
        }
    }
}
