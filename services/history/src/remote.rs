//! Client for the optional history backend
//!
//! Every call carries the configured timeout so that an unreachable backend
//! fails fast and the reconciler can fall back to the local cache.

use async_trait::async_trait;
use common::ocr::ImageUpload;
use reqwest::{Client, multipart};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::RemoteEntry;

/// Why a backend call did not produce a usable answer
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Connection refused, timeout, or a body that is not the expected JSON
    #[error("Backend not available: {0}")]
    Unavailable(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend answered 2xx but reported `success: false`
    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    /// No backend is configured
    #[error("No backend configured")]
    NotConfigured,
}

/// Type alias for Result with RemoteError
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Text returned by the backend for an uploaded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrReceipt {
    pub document_id: Option<i64>,
    pub text: String,
}

/// The backend's history and OCR endpoints
#[async_trait]
pub trait RemoteHistory: Send + Sync {
    /// `GET /history`
    async fn list(&self) -> RemoteResult<Vec<RemoteEntry>>;

    /// `DELETE /history/{id}`
    async fn delete(&self, document_id: i64) -> RemoteResult<()>;

    /// `POST /ocr`; the backend stores the result as a side effect
    async fn submit_ocr(&self, image: &ImageUpload) -> RemoteResult<OcrReceipt>;
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    history: Vec<RemoteEntry>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    success: bool,
    document_id: Option<i64>,
    #[serde(default)]
    text: String,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
}

/// [`RemoteHistory`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`
    pub fn new(base_url: &str, timeout: Duration) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn error_for_status(response: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Error bodies are `{"error": "..."}` when the backend produced them
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<AckResponse>(&body)
            .ok()
            .and_then(|ack| ack.error)
            .unwrap_or(body);

        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteHistory for HttpRemote {
    async fn list(&self) -> RemoteResult<Vec<RemoteEntry>> {
        let url = self.url("history");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let body: HistoryResponse = Self::error_for_status(response).await?.json().await?;

        if !body.success {
            return Err(RemoteError::Rejected(
                body.error.unwrap_or_else(|| "Backend not available".to_string()),
            ));
        }

        info!("Fetched {} history entries from backend", body.history.len());
        Ok(body.history)
    }

    async fn delete(&self, document_id: i64) -> RemoteResult<()> {
        let url = self.url(&format!("history/{}", document_id));
        debug!("DELETE {}", url);

        let response = self.client.delete(&url).send().await?;
        let body: AckResponse = Self::error_for_status(response).await?.json().await?;

        if !body.success {
            return Err(RemoteError::Rejected(
                body.error.unwrap_or_else(|| format!("Failed to delete {}", document_id)),
            ));
        }
        Ok(())
    }

    async fn submit_ocr(&self, image: &ImageUpload) -> RemoteResult<OcrReceipt> {
        let url = self.url("ocr");
        debug!("POST {} ({} bytes)", url, image.bytes.len());

        let mut part =
            multipart::Part::bytes(image.bytes.clone()).file_name(image.display_name().to_string());
        if let Some(content_type) = image.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = multipart::Form::new().part("image", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let body: OcrResponse = Self::error_for_status(response).await?.json().await?;

        if !body.success {
            return Err(RemoteError::Rejected(
                body.error.unwrap_or_else(|| "OCR failed".to_string()),
            ));
        }

        Ok(OcrReceipt {
            document_id: body.document_id,
            text: body.text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_join_cleanly() {
        let remote = HttpRemote::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(remote.base_url(), "http://localhost:5000/api");
        assert_eq!(remote.url("history"), "http://localhost:5000/api/history");
        assert_eq!(remote.url("/history/3"), "http://localhost:5000/api/history/3");
    }

    #[test]
    fn test_history_response_tolerates_missing_fields() {
        let body: HistoryResponse = serde_json::from_str(r#"{"error":"down"}"#).unwrap();
        assert!(!body.success);
        assert!(body.history.is_empty());
        assert_eq!(body.error.as_deref(), Some("down"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        // Port 9 (discard) is closed on test machines
        let remote = HttpRemote::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        assert!(matches!(remote.list().await, Err(RemoteError::Unavailable(_))));
        assert!(matches!(remote.delete(1).await, Err(RemoteError::Unavailable(_))));
    }
}
