//! Client configuration
//!
//! Values come from built-in defaults, then an optional `ink2text.toml`, then
//! `INK2TEXT_*` environment variables (e.g. `INK2TEXT_API_BASE_URL`).

use auth::PasswordPolicy;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::converter::OcrMode;
use crate::error::HistoryResult;
use crate::local::DEFAULT_CAPACITY;
use crate::reconciler::HistoryMode;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "ink2text.toml";

/// Which persisted store backs the session and the local cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    File,
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend API root; empty disables the backend
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub history_mode: HistoryMode,
    pub ocr_mode: OcrMode,
    pub password_policy: PasswordPolicy,
    pub store_backend: StoreBackend,
    pub state_path: PathBuf,
    pub redis_url: String,
    pub tesseract_cmd: String,
    pub language: String,
    pub history_capacity: usize,
    pub log_level: String,
}

impl ClientConfig {
    /// Load from `file` (or [`DEFAULT_CONFIG_FILE`]) and the environment
    pub fn load(file: Option<PathBuf>) -> HistoryResult<Self> {
        let file = file.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config = Config::builder()
            .set_default("api_base_url", "http://localhost:5000/api")?
            .set_default("request_timeout_secs", 8_i64)?
            .set_default("history_mode", "hybrid")?
            .set_default("ocr_mode", "local")?
            .set_default("password_policy", "strict")?
            .set_default("store_backend", "file")?
            .set_default("state_path", "ink2text-state.json")?
            .set_default("redis_url", "redis://localhost:6379")?
            .set_default("tesseract_cmd", "tesseract")?
            .set_default("language", "eng")?
            .set_default("history_capacity", DEFAULT_CAPACITY as i64)?
            .set_default("log_level", "info")?
            .add_source(File::from(file).required(false))
            .add_source(Environment::with_prefix("INK2TEXT").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Whether a backend URL is configured
    pub fn backend_enabled(&self) -> bool {
        !self.api_base_url.trim().is_empty()
    }
}
