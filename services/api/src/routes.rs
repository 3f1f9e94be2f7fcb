//! API service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use common::ocr::{ImageUpload, OcrError, SERVER_UPLOAD_POLICY};
use serde_json::json;
use tracing::info;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{HealthResponse, HistoryItem, HistoryResponse, MessageResponse, OcrResponse},
};

/// Confidence recorded with every extraction
pub const CONFIDENCE_SCORE: f32 = 0.90;

/// Request bodies may exceed the upload limit by this much multipart overhead
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health_check))
        .route("/api/history", get(get_history))
        .route("/api/history/:id", delete(delete_history_entry))
        .route("/api/ocr", post(ocr_image))
        .layer(DefaultBodyLimit::max(
            SERVER_UPLOAD_POLICY.max_bytes + MULTIPART_OVERHEAD,
        ))
        .with_state(state)
}

pub async fn home() -> impl IntoResponse {
    Json(json!({
        "message": "Ink2Text backend running"
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.documents.health_check().await {
        "connected"
    } else {
        "disconnected"
    };
    let ocr = if state.ocr.is_available().await {
        "available"
    } else {
        "unavailable"
    };

    Json(HealthResponse {
        status: "running".to_string(),
        database: format!("{} ({})", database, state.documents.backend()),
        ocr: format!("{} ({})", ocr, state.ocr.name()),
    })
}

/// List stored extractions, newest first
pub async fn get_history(State(state): State<AppState>) -> ApiResult<Json<HistoryResponse>> {
    let history: Vec<HistoryItem> = state
        .documents
        .list()
        .await?
        .into_iter()
        .map(HistoryItem::from)
        .collect();

    Ok(Json(HistoryResponse {
        success: true,
        history,
    }))
}

/// Delete one document and its text
pub async fn delete_history_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.documents.delete(id).await? {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    info!("Deleted document {}", id);
    Ok(Json(MessageResponse {
        success: true,
        message: format!("Document {} deleted", id),
    }))
}

/// Accept a multipart `image` field, run OCR on it and store the result
pub async fn ocr_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<OcrResponse>> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        upload = Some(ImageUpload::new(file_name, content_type, bytes.to_vec()));
    }

    let upload = upload.ok_or(OcrError::MissingImage)?;
    process_upload(&state, upload).await.map(Json)
}

/// Validate, recognize and store one upload
pub async fn process_upload(state: &AppState, upload: ImageUpload) -> ApiResult<OcrResponse> {
    if upload.file_name.as_deref().is_none_or(|name| name.trim().is_empty()) {
        return Err(OcrError::MissingImage.into());
    }
    upload.validate(&SERVER_UPLOAD_POLICY)?;

    let text = state.ocr.recognize(&upload, &state.language).await?;
    let document = state
        .documents
        .insert(upload.display_name(), &text, CONFIDENCE_SCORE)
        .await?;

    info!(
        "Extracted {} characters from {} as document {}",
        text.chars().count(),
        document.file_name,
        document.document_id
    );

    Ok(OcrResponse {
        success: true,
        message: "OCR saved successfully".to_string(),
        document_id: document.document_id,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{DocumentStore, InMemoryDocumentRepository};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use common::ocr::OcrEngine;
    use std::sync::Arc;

    struct CannedEngine(Result<&'static str, &'static str>);

    #[async_trait]
    impl OcrEngine for CannedEngine {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn is_available(&self) -> bool {
            self.0.is_ok()
        }

        async fn recognize(&self, _image: &ImageUpload, _language: &str) -> Result<String, OcrError> {
            self.0
                .map(str::to_string)
                .map_err(|e| OcrError::Processing(e.to_string()))
        }
    }

    fn state(engine: CannedEngine) -> AppState {
        AppState {
            documents: Arc::new(InMemoryDocumentRepository::new()),
            ocr: Arc::new(engine),
            language: "eng".to_string(),
        }
    }

    fn png(name: &str) -> ImageUpload {
        ImageUpload::new(Some(name.to_string()), Some("image/png".to_string()), vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_upload_is_stored_and_listed() {
        let state = state(CannedEngine(Ok("hello world")));

        let response = process_upload(&state, png("note.png")).await.unwrap();
        assert!(response.success);
        assert_eq!(response.text, "hello world");
        assert_eq!(response.message, "OCR saved successfully");

        let Json(history) = get_history(State(state.clone())).await.unwrap();
        assert!(history.success);
        assert_eq!(history.history.len(), 1);
        assert_eq!(history.history[0].document_id, response.document_id);
        assert_eq!(history.history[0].file_name, "note.png");
    }

    #[tokio::test]
    async fn test_upload_without_name_is_rejected() {
        let state = state(CannedEngine(Ok("text")));
        let upload = ImageUpload::new(None, Some("image/png".to_string()), vec![1]);

        let error = process_upload(&state, upload).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.message(), "No image uploaded");
    }

    #[tokio::test]
    async fn test_unsupported_type_is_rejected() {
        let state = state(CannedEngine(Ok("text")));

        let error = process_upload(&state, png("scan.bmp")).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error.message(),
            "Invalid file type. Allowed: png, jpg, jpeg, gif, webp"
        );
    }

    #[tokio::test]
    async fn test_engine_failure_stores_nothing() {
        let state = state(CannedEngine(Err("engine crashed")));

        let error = process_upload(&state, png("note.png")).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.documents.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_document() {
        let state = state(CannedEngine(Ok("text")));

        let error = delete_history_entry(State(state), Path(42)).await.unwrap_err();
        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.message(), "Document not found");
    }

    #[tokio::test]
    async fn test_delete_removes_document() {
        let state = state(CannedEngine(Ok("text")));
        let stored = process_upload(&state, png("note.png")).await.unwrap();

        let Json(ack) = delete_history_entry(State(state.clone()), Path(stored.document_id))
            .await
            .unwrap();
        assert!(ack.success);

        let Json(history) = get_history(State(state)).await.unwrap();
        assert!(history.history.is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_components() {
        let Json(health) = health_check(State(state(CannedEngine(Err("missing"))))).await;

        assert_eq!(health.status, "running");
        assert_eq!(health.database, "connected (memory)");
        assert_eq!(health.ocr, "unavailable (canned)");
    }
}
