//! Application state shared across handlers

use common::ocr::OcrEngine;
use std::sync::Arc;

use crate::repositories::DocumentStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub ocr: Arc<dyn OcrEngine>,
    /// Language hint passed to the OCR engine
    pub language: String,
}
