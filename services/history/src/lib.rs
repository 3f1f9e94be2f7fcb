//! Conversion history for Ink2Text
//!
//! Resolves "the current history" from the optional backend and the local
//! cache, normalizes both record shapes, and drives the image-to-text flow
//! that feeds it.

pub mod config;
pub mod context;
pub mod converter;
pub mod error;
pub mod export;
pub mod local;
pub mod models;
pub mod reconciler;
pub mod remote;

pub use context::AppContext;
pub use converter::{Conversion, Converter, OcrMode, SavedTo};
pub use error::{HistoryError, HistoryResult};
pub use models::{EntryId, EntryTimestamp, HistoryEntry, LocalEntry, RemoteEntry, WireEntry};
pub use reconciler::{ClearSummary, HistoryMode, HistoryReconciler};
pub use remote::{HttpRemote, OcrReceipt, RemoteError, RemoteHistory};
