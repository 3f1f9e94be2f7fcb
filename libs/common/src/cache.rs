//! Redis-backed key-value store
//!
//! Lets several client processes on different machines share one session and
//! one local history cache. Keys are namespaced so the same Redis database can
//! hold other data.

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::error::StoreResult;
use crate::store::KeyValueStore;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Prefix prepended to every key
    pub namespace: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_NAMESPACE`: key prefix (default: "ink2text")
    pub fn from_env() -> Self {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let namespace =
            std::env::var("REDIS_NAMESPACE").unwrap_or_else(|_| "ink2text".to_string());

        RedisConfig { url, namespace }
    }
}

/// Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    namespace: String,
}

impl RedisPool {
    /// Initialize a new Redis client. No connection is made until first use.
    pub fn new(config: &RedisConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool {
            client,
            namespace: config.namespace.clone(),
        })
    }

    /// Get a connection from the pool
    async fn get_connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[async_trait]
impl KeyValueStore for RedisPool {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(self.key(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(self.key(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() -> StoreResult<()> {
        let pool = RedisPool::new(&RedisConfig {
            url: "redis://localhost:6379".to_string(),
            namespace: "ink2text-test".to_string(),
        })?;

        assert_eq!(pool.key("ocr-history"), "ink2text-test:ocr-history");
        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_set_get_delete() -> StoreResult<()> {
        let pool = RedisPool::new(&RedisConfig {
            url: "redis://localhost:6379".to_string(),
            namespace: "ink2text-test".to_string(),
        })?;
        assert!(pool.health_check().await?);

        pool.set("user", "test_value").await?;
        assert_eq!(pool.get("user").await?, Some("test_value".to_string()));

        pool.delete("user").await?;
        assert_eq!(pool.get("user").await?, None);

        Ok(())
    }
}
