//! OCR engine port and the `tesseract` adapter
//!
//! Text recognition itself is delegated to an external engine. Both the client
//! and the backend go through [`OcrEngine`] so that tests can swap the engine
//! for a canned one.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};
use uuid::Uuid;

/// File name used when an upload does not carry one
pub const UNTITLED: &str = "Untitled";

/// Errors raised while validating an upload or running the engine
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("No image uploaded")]
    MissingImage,

    #[error("Invalid file type. Allowed: {}", .allowed.join(", "))]
    UnsupportedType { allowed: Vec<String> },

    #[error("Image must be smaller than {} MB", .max_bytes / (1024 * 1024))]
    TooLarge { max_bytes: usize },

    #[error("OCR engine is not available: {0}")]
    Unavailable(String),

    #[error("OCR processing failed: {0}")]
    Processing(String),
}

/// Which uploads a caller accepts
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub allowed_extensions: &'static [&'static str],
    pub max_bytes: usize,
}

/// Uploads accepted by the client before any OCR runs
pub const CLIENT_UPLOAD_POLICY: UploadPolicy = UploadPolicy {
    allowed_extensions: &["jpg", "jpeg", "png", "webp"],
    max_bytes: 5 * 1024 * 1024,
};

/// Uploads accepted by the backend's `/api/ocr` endpoint
pub const SERVER_UPLOAD_POLICY: UploadPolicy = UploadPolicy {
    allowed_extensions: &["png", "jpg", "jpeg", "gif", "webp"],
    max_bytes: 16 * 1024 * 1024,
};

/// An image handed to OCR
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: Option<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read an image from disk, keeping its file name
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        Ok(Self::new(file_name, None, bytes))
    }

    /// File name to record in history
    pub fn display_name(&self) -> &str {
        match self.file_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => UNTITLED,
        }
    }

    /// Lower-cased extension from the file name, or the subtype of an
    /// `image/*` content type when the name has none
    pub fn extension(&self) -> Option<String> {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty());

        from_name.or_else(|| {
            self.content_type
                .as_deref()
                .and_then(|ct| ct.strip_prefix("image/"))
                .map(|subtype| subtype.to_ascii_lowercase())
        })
    }

    /// Check the upload against `policy`
    pub fn validate(&self, policy: &UploadPolicy) -> Result<(), OcrError> {
        if self.bytes.is_empty() {
            return Err(OcrError::MissingImage);
        }

        let allowed = match self.extension() {
            Some(ext) => policy.allowed_extensions.contains(&ext.as_str()),
            None => false,
        };
        if !allowed {
            return Err(OcrError::UnsupportedType {
                allowed: policy
                    .allowed_extensions
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect(),
            });
        }

        if self.bytes.len() > policy.max_bytes {
            return Err(OcrError::TooLarge {
                max_bytes: policy.max_bytes,
            });
        }

        Ok(())
    }
}

/// A text recognition engine
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs and health reports
    fn name(&self) -> &'static str;

    /// Check if the engine can be used
    async fn is_available(&self) -> bool;

    /// Extract text from `image`, using `language` as a hint (e.g. "eng")
    async fn recognize(&self, image: &ImageUpload, language: &str) -> Result<String, OcrError>;
}

/// Runs the `tesseract` command-line tool
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    command: PathBuf,
}

impl TesseractEngine {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn recognize(&self, image: &ImageUpload, language: &str) -> Result<String, OcrError> {
        let extension = image.extension().unwrap_or_else(|| "png".to_string());
        let input_path =
            std::env::temp_dir().join(format!("ink2text_{}.{}", Uuid::new_v4(), extension));

        tokio::fs::write(&input_path, &image.bytes)
            .await
            .map_err(|e| OcrError::Processing(format!("Failed to write temp file: {}", e)))?;

        debug!(
            "Running {} on {} ({} bytes)",
            self.command.display(),
            image.display_name(),
            image.bytes.len()
        );

        let output = Command::new(&self.command)
            .arg(&input_path)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .output()
            .await;

        let _ = tokio::fs::remove_file(&input_path).await;

        let output = output.map_err(|e| OcrError::Unavailable(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Processing(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        info!(
            "Recognized {} characters from {}",
            text.chars().count(),
            image.display_name()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: Option<&str>, content_type: Option<&str>, size: usize) -> ImageUpload {
        ImageUpload::new(
            name.map(str::to_string),
            content_type.map(str::to_string),
            vec![0u8; size],
        )
    }

    #[test]
    fn test_display_name_defaults_to_untitled() {
        assert_eq!(upload(None, None, 1).display_name(), "Untitled");
        assert_eq!(upload(Some("  "), None, 1).display_name(), "Untitled");
        assert_eq!(upload(Some("note.png"), None, 1).display_name(), "note.png");
    }

    #[test]
    fn test_extension_prefers_file_name() {
        assert_eq!(
            upload(Some("Scan.JPG"), Some("image/png"), 1).extension(),
            Some("jpg".to_string())
        );
        assert_eq!(
            upload(Some("scan"), Some("image/webp"), 1).extension(),
            Some("webp".to_string())
        );
        assert_eq!(upload(None, Some("text/plain"), 1).extension(), None);
    }

    #[test]
    fn test_client_policy() {
        assert!(upload(Some("a.png"), None, 10).validate(&CLIENT_UPLOAD_POLICY).is_ok());
        assert!(matches!(
            upload(Some("a.gif"), None, 10).validate(&CLIENT_UPLOAD_POLICY),
            Err(OcrError::UnsupportedType { .. })
        ));
        assert!(matches!(
            upload(Some("a.png"), None, 5 * 1024 * 1024 + 1).validate(&CLIENT_UPLOAD_POLICY),
            Err(OcrError::TooLarge { .. })
        ));
        assert!(matches!(
            upload(Some("a.png"), None, 0).validate(&CLIENT_UPLOAD_POLICY),
            Err(OcrError::MissingImage)
        ));
    }

    #[test]
    fn test_server_policy_accepts_gif() {
        assert!(upload(Some("a.gif"), None, 10).validate(&SERVER_UPLOAD_POLICY).is_ok());
        let err = upload(Some("a.bmp"), None, 10)
            .validate(&SERVER_UPLOAD_POLICY)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid file type. Allowed: png, jpg, jpeg, gif, webp"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let engine = TesseractEngine::new("/nonexistent/tesseract-binary");
        assert!(!engine.is_available().await);

        let result = engine
            .recognize(&upload(Some("a.png"), None, 4), "eng")
            .await;
        assert!(matches!(result, Err(OcrError::Unavailable(_))));
    }
}
