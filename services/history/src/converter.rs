//! Image to text conversion flow
//!
//! Gate on the session, validate the upload, run OCR locally or on the
//! backend, then make sure the result lands in history somewhere.

use auth::SessionStore;
use common::ocr::{CLIENT_UPLOAD_POLICY, ImageUpload, OcrEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{HistoryError, HistoryResult};
use crate::reconciler::{HistoryMode, HistoryReconciler};
use crate::remote::{RemoteError, RemoteHistory};

/// Where OCR runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OcrMode {
    /// The local engine recognizes; the backend is only asked to store
    #[default]
    Local,
    /// The backend recognizes and stores
    Backend,
}

/// Where a conversion was saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedTo {
    /// Stored by the backend under this document id
    Remote(Option<i64>),
    /// Written to the local cache
    Local,
}

/// A finished conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    pub file_name: String,
    pub saved_to: SavedTo,
}

pub struct Converter {
    sessions: SessionStore,
    history: Arc<HistoryReconciler>,
    engine: Arc<dyn OcrEngine>,
    remote: Option<Arc<dyn RemoteHistory>>,
    mode: OcrMode,
    language: String,
}

impl Converter {
    pub fn new(
        sessions: SessionStore,
        history: Arc<HistoryReconciler>,
        engine: Arc<dyn OcrEngine>,
        remote: Option<Arc<dyn RemoteHistory>>,
        mode: OcrMode,
        language: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            history,
            engine,
            remote,
            mode,
            language: language.into(),
        }
    }

    /// Convert `image` to text and save it to history
    pub async fn convert(&self, image: ImageUpload) -> HistoryResult<Conversion> {
        if !self.sessions.is_signed_in().await {
            return Err(HistoryError::SignInRequired);
        }
        image.validate(&CLIENT_UPLOAD_POLICY)?;

        let file_name = image.display_name().to_string();
        info!("Converting {} with {:?} OCR", file_name, self.mode);

        match self.mode {
            OcrMode::Backend => {
                let remote = self.remote.as_ref().ok_or(RemoteError::NotConfigured)?;
                let receipt = remote.submit_ocr(&image).await?;

                // Local-only history never reads the backend, so keep a copy
                let saved_to = match self.history.mode() {
                    HistoryMode::LocalOnly => {
                        self.history.record_entry(&receipt.text, &file_name).await?;
                        SavedTo::Local
                    }
                    HistoryMode::Hybrid => SavedTo::Remote(receipt.document_id),
                };

                Ok(Conversion {
                    text: receipt.text,
                    file_name,
                    saved_to,
                })
            }
            OcrMode::Local => {
                let text = self.engine.recognize(&image, &self.language).await?;
                let saved_to = self.save(&image, &text, &file_name).await?;
                Ok(Conversion {
                    text,
                    file_name,
                    saved_to,
                })
            }
        }
    }

    async fn save(&self, image: &ImageUpload, text: &str, file_name: &str) -> HistoryResult<SavedTo> {
        if self.history.mode() == HistoryMode::LocalOnly {
            self.history.record_entry(text, file_name).await?;
            return Ok(SavedTo::Local);
        }

        if let Some(remote) = self.remote.as_ref() {
            match remote.submit_ocr(image).await {
                Ok(receipt) => {
                    self.history.record_entry(text, file_name).await?;
                    return Ok(SavedTo::Remote(receipt.document_id));
                }
                Err(e) => warn!("{}, saving locally", e),
            }
        }

        self.history.append_local(text, file_name).await?;
        Ok(SavedTo::Local)
    }
}
