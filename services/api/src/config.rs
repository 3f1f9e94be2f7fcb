//! Service configuration read from the environment

use std::env;
use std::str::FromStr;

/// Where documents are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageKind::Postgres),
            "memory" => Ok(StorageKind::Memory),
            other => Err(format!("Unknown STORAGE value: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Socket address to listen on (default: 0.0.0.0:5000)
    pub bind_address: String,
    pub storage: StorageKind,
    /// Path or name of the tesseract binary
    pub tesseract_cmd: String,
    /// Language passed to the OCR engine
    pub language: String,
}

impl ApiConfig {
    /// Create a new ApiConfig from environment variables
    pub fn from_env() -> Result<Self, String> {
        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
        let storage = env::var("STORAGE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;
        let tesseract_cmd = env::var("TESSERACT_CMD").unwrap_or_else(|_| "tesseract".to_string());
        let language = env::var("OCR_LANGUAGE").unwrap_or_else(|_| "eng".to_string());

        Ok(ApiConfig {
            bind_address,
            storage,
            tesseract_cmd,
            language,
        })
    }
}
