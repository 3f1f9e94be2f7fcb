//! API models for request and response payloads

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used on the wire
pub const UPLOADED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A document joined with its extracted text
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub document_id: i64,
    pub file_name: String,
    pub uploaded_at: NaiveDateTime,
    pub text: String,
}

/// One row of `GET /api/history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub document_id: i64,
    pub file_name: String,
    pub uploaded_at: String,
    pub text: String,
}

impl From<StoredDocument> for HistoryItem {
    fn from(document: StoredDocument) -> Self {
        Self {
            document_id: document.document_id,
            file_name: document.file_name,
            uploaded_at: document.uploaded_at.format(UPLOADED_AT_FORMAT).to_string(),
            text: document.text,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<HistoryItem>,
}

/// Response for `POST /api/ocr`
#[derive(Debug, Serialize, Deserialize)]
pub struct OcrResponse {
    pub success: bool,
    pub message: String,
    pub document_id: i64,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub ocr: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_history_item_formats_timestamp() {
        let uploaded_at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let item = HistoryItem::from(StoredDocument {
            document_id: 12,
            file_name: "note.png".to_string(),
            uploaded_at,
            text: "hello".to_string(),
        });

        assert_eq!(item.uploaded_at, "2024-05-01 10:00:00");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["document_id"], 12);
        assert_eq!(json["file_name"], "note.png");
    }
}
