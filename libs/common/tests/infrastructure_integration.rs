//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL database and Redis cache
//! are properly configured and accessible from the application.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, ensure_schema, health_check, init_pool},
    store::KeyValueStore,
};
use sqlx::Row;

/// Test that verifies both PostgreSQL and Redis are accessible
/// and can perform basic operations
#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize PostgreSQL connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Verify PostgreSQL connectivity
    assert!(health_check(&pool).await?, "Database health check failed");

    // Schema creation must be repeatable
    ensure_schema(&pool).await?;
    ensure_schema(&pool).await?;

    let row = sqlx::query(
        "SELECT COUNT(*) AS tables FROM information_schema.tables \
         WHERE table_name IN ('documents', 'ocr_text')",
    )
    .fetch_one(&pool)
    .await?;
    let tables: i64 = row.get("tables");
    assert_eq!(tables, 2, "Document tables are missing");

    // Initialize Redis client
    let redis_pool = RedisPool::new(&RedisConfig::from_env())?;

    // Verify Redis connectivity
    assert!(
        redis_pool.health_check().await?,
        "Redis health check failed"
    );

    let test_key = "integration_test_key";
    let test_value = "integration_test_value";

    redis_pool.set(test_key, test_value).await?;
    assert_eq!(
        redis_pool.get(test_key).await?,
        Some(test_value.to_string()),
        "Redis SET/GET test failed"
    );

    // Clean up - delete the key
    redis_pool.delete(test_key).await?;
    assert_eq!(
        redis_pool.get(test_key).await?,
        None,
        "Redis delete operation failed"
    );

    Ok(())
}
