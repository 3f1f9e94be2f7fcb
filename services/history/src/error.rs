//! Error types for the history client

use common::error::StoreError;
use common::ocr::OcrError;
use thiserror::Error;

use crate::remote::RemoteError;

/// Errors surfaced by the reconciler, the converter and the CLI plumbing
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The operation needs a signed-in user
    #[error("Please login to use OCR and history")]
    SignInRequired,

    /// Upload validation or OCR failed
    #[error(transparent)]
    Ocr(#[from] OcrError),

    /// The backend could not be used and there was nothing to fall back to
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The local cache could not be written
    #[error("Local history error: {0}")]
    Store(#[from] StoreError),

    /// Local history could not be encoded
    #[error("Failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),

    /// There is no text to save or copy
    #[error("No text to save")]
    EmptyText,

    /// Client configuration is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with HistoryError
pub type HistoryResult<T> = Result<T, HistoryError>;
