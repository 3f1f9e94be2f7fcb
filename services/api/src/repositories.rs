//! Repositories for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::StoredDocument;

/// Storage for OCR'd documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for the health report
    fn backend(&self) -> &'static str;

    /// Store a document and its text, returning the stored row
    async fn insert(&self, file_name: &str, text: &str, confidence: f32) -> Result<StoredDocument>;

    /// All documents, newest first
    async fn list(&self) -> Result<Vec<StoredDocument>>;

    /// Delete a document and its text. Returns false when the id is unknown.
    async fn delete(&self, document_id: i64) -> Result<bool>;

    async fn health_check(&self) -> bool;
}

/// Document repository over the `documents` and `ocr_text` tables
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    /// Create a new document repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, file_name: &str, text: &str, confidence: f32) -> Result<StoredDocument> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO documents (file_name)
            VALUES ($1)
            RETURNING document_id, uploaded_at
            "#,
        )
        .bind(file_name)
        .fetch_one(&mut *tx)
        .await?;
        let document_id: i64 = row.get("document_id");

        sqlx::query(
            r#"
            INSERT INTO ocr_text (document_id, extracted_text, confidence_score)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(document_id)
        .bind(text)
        .bind(confidence)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Stored document {} ({})", document_id, file_name);

        Ok(StoredDocument {
            document_id,
            file_name: file_name.to_string(),
            uploaded_at: row.get("uploaded_at"),
            text: text.to_string(),
        })
    }

    async fn list(&self) -> Result<Vec<StoredDocument>> {
        let rows = sqlx::query(
            r#"
            SELECT d.document_id, d.file_name, d.uploaded_at, o.extracted_text
            FROM documents d
            JOIN ocr_text o ON o.document_id = d.document_id
            ORDER BY d.uploaded_at DESC, d.document_id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let documents = rows
            .into_iter()
            .map(|row| StoredDocument {
                document_id: row.get("document_id"),
                file_name: row.get("file_name"),
                uploaded_at: row.get("uploaded_at"),
                text: row.get("extracted_text"),
            })
            .collect();

        Ok(documents)
    }

    async fn delete(&self, document_id: i64) -> Result<bool> {
        // ocr_text rows go with the document (ON DELETE CASCADE)
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE document_id = $1
            "#,
        )
        .bind(document_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> bool {
        common::database::health_check(&self.pool)
            .await
            .unwrap_or(false)
    }
}

/// Document repository kept in process memory
///
/// Ids are never reused, even after the newest document is deleted.
#[derive(Default)]
pub struct InMemoryDocumentRepository {
    documents: RwLock<Vec<StoredDocument>>,
    last_id: AtomicI64,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, file_name: &str, text: &str, _confidence: f32) -> Result<StoredDocument> {
        let mut documents = self.documents.write().await;
        let document_id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;

        let document = StoredDocument {
            document_id,
            file_name: file_name.to_string(),
            uploaded_at: Utc::now().naive_utc(),
            text: text.to_string(),
        };
        documents.push(document.clone());
        Ok(document)
    }

    async fn list(&self) -> Result<Vec<StoredDocument>> {
        let mut documents = self.documents.read().await.clone();
        documents.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then(b.document_id.cmp(&a.document_id))
        });
        Ok(documents)
    }

    async fn delete(&self, document_id: i64) -> Result<bool> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|d| d.document_id != document_id);
        Ok(documents.len() < before)
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_repository_lists_newest_first() {
        let repo = InMemoryDocumentRepository::new();
        let first = repo.insert("a.png", "first", 0.9).await.unwrap();
        let second = repo.insert("b.png", "second", 0.9).await.unwrap();

        assert_eq!(second.document_id, first.document_id + 1);

        let listed = repo.list().await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|d| d.document_id).collect();
        assert_eq!(ids, vec![second.document_id, first.document_id]);
    }

    #[tokio::test]
    async fn test_memory_repository_delete() {
        let repo = InMemoryDocumentRepository::new();
        let document = repo.insert("a.png", "text", 0.9).await.unwrap();

        assert!(repo.delete(document.document_id).await.unwrap());
        assert!(!repo.delete(document.document_id).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_repository_never_reuses_ids() {
        let repo = InMemoryDocumentRepository::new();
        repo.insert("a.png", "first", 0.9).await.unwrap();
        let newest = repo.insert("b.png", "second", 0.9).await.unwrap();
        repo.delete(newest.document_id).await.unwrap();

        let next = repo.insert("c.png", "third", 0.9).await.unwrap();
        assert_eq!(next.document_id, newest.document_id + 1);
    }
}
