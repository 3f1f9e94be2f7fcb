//! Application context
//!
//! Built once at startup and passed to whatever needs the session, history or
//! converter.

use auth::SessionStore;
use common::cache::{RedisConfig, RedisPool};
use common::ocr::{OcrEngine, TesseractEngine};
use common::store::{FileStore, KeyValueStore, MemoryStore};
use std::sync::Arc;
use tracing::info;

use crate::config::{ClientConfig, StoreBackend};
use crate::converter::Converter;
use crate::error::HistoryResult;
use crate::local::LocalHistoryCache;
use crate::reconciler::HistoryReconciler;
use crate::remote::{HttpRemote, RemoteHistory};

pub struct AppContext {
    pub config: ClientConfig,
    pub sessions: SessionStore,
    pub history: Arc<HistoryReconciler>,
    pub converter: Converter,
}

impl AppContext {
    /// Wire everything from configuration, using `tesseract` for OCR
    pub fn from_config(config: ClientConfig) -> HistoryResult<Self> {
        let store: Arc<dyn KeyValueStore> = match config.store_backend {
            StoreBackend::File => Arc::new(FileStore::new(&config.state_path)),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Redis => Arc::new(RedisPool::new(&RedisConfig {
                url: config.redis_url.clone(),
                namespace: "ink2text".to_string(),
            })?),
        };

        let remote: Option<Arc<dyn RemoteHistory>> = if config.backend_enabled() {
            Some(Arc::new(HttpRemote::new(
                &config.api_base_url,
                config.request_timeout(),
            )?))
        } else {
            None
        };

        let engine: Arc<dyn OcrEngine> = Arc::new(TesseractEngine::new(&config.tesseract_cmd));

        Ok(Self::assemble(config, store, remote, engine))
    }

    /// Wire a context from already-built parts
    pub fn assemble(
        config: ClientConfig,
        store: Arc<dyn KeyValueStore>,
        remote: Option<Arc<dyn RemoteHistory>>,
        engine: Arc<dyn OcrEngine>,
    ) -> Self {
        let sessions = SessionStore::new(store.clone(), config.password_policy);
        let local = LocalHistoryCache::new(store, config.history_capacity);
        let history = Arc::new(HistoryReconciler::new(
            sessions.clone(),
            remote.clone(),
            local,
            config.history_mode,
        ));
        let converter = Converter::new(
            sessions.clone(),
            history.clone(),
            engine,
            remote,
            config.ocr_mode,
            config.language.clone(),
        );

        info!(
            "Context ready: {:?} history, {:?} OCR, {:?} store",
            config.history_mode, config.ocr_mode, config.store_backend
        );

        Self {
            config,
            sessions,
            history,
            converter,
        }
    }
}
