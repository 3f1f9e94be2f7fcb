use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use api::config::{ApiConfig, StorageKind};
use api::repositories::{DocumentStore, InMemoryDocumentRepository, PgDocumentRepository};
use api::{AppState, create_router};
use common::database::{DatabaseConfig, ensure_schema, init_pool};
use common::ocr::{OcrEngine, TesseractEngine};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Ink2Text backend");

    let config = ApiConfig::from_env().map_err(anyhow::Error::msg)?;

    let documents: Arc<dyn DocumentStore> = match config.storage {
        StorageKind::Postgres => {
            // Initialize database connection pool
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            // Check database connectivity
            if common::database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            ensure_schema(&pool).await?;
            Arc::new(PgDocumentRepository::new(pool))
        }
        StorageKind::Memory => {
            warn!("Using in-memory storage; documents are lost on restart");
            Arc::new(InMemoryDocumentRepository::new())
        }
    };

    let ocr: Arc<dyn OcrEngine> = Arc::new(TesseractEngine::new(&config.tesseract_cmd));
    if !ocr.is_available().await {
        warn!(
            "OCR engine '{}' not found; /api/ocr will fail until it is installed",
            config.tesseract_cmd
        );
    }

    let app_state = AppState {
        documents,
        ocr,
        language: config.language,
    };

    // Start the web server
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("API service listening on {}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
