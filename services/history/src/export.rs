//! Saving extracted text to a file

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{HistoryError, HistoryResult};

/// Default download name, e.g. `ink2text-2024-05-01.txt`
pub fn suggested_file_name(date: NaiveDate) -> String {
    format!("ink2text-{}.txt", date.format("%Y-%m-%d"))
}

/// Write `text` to `target`
///
/// When `target` is a directory the suggested name for `date` is used inside
/// it. Returns the path written.
pub async fn save_text(target: &Path, text: &str, date: NaiveDate) -> HistoryResult<PathBuf> {
    if text.trim().is_empty() {
        return Err(HistoryError::EmptyText);
    }

    let path = if tokio::fs::metadata(target)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
    {
        target.join(suggested_file_name(date))
    } else {
        target.to_path_buf()
    };

    tokio::fs::write(&path, text).await?;
    info!("Saved {} characters to {}", text.chars().count(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_suggested_file_name() {
        assert_eq!(suggested_file_name(may_first()), "ink2text-2024-05-01.txt");
    }

    #[tokio::test]
    async fn test_save_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_text(dir.path(), "hello", may_first()).await.unwrap();

        assert_eq!(path, dir.path().join("ink2text-2024-05-01.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_save_to_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.txt");
        let path = save_text(&target, "hello", may_first()).await.unwrap();
        assert_eq!(path, target);
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = save_text(dir.path(), "  \n", may_first()).await;
        assert!(matches!(result, Err(HistoryError::EmptyText)));
    }
}
