//! Redis-backed store client.

use super::StoreClient;
use async_trait::async_trait;
use bazaar_config::StoreConfig;
use bazaar_core::{BazaarError, BazaarResult, HealthCheck, HealthStatus};
use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Create a Redis connection pool.
///
/// Connections are opened lazily, so an unreachable store does not stop
/// startup; the first command against it fails with `StoreUnavailable`.
pub fn create_pool(config: &StoreConfig) -> BazaarResult<Pool> {
    let url = config.url();
    info!("Creating key-value store pool for {}", url);

    Config::from_url(url)
        .builder()
        .map_err(|e| BazaarError::Configuration(format!("Invalid store config: {}", e)))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| BazaarError::Configuration(format!("Failed to create store pool: {}", e)))
}

/// Store client speaking to Redis through a connection pool.
#[derive(Component)]
#[shaku(interface = StoreClient)]
pub struct RedisStoreClient {
    /// Redis connection pool. `None` when the store is disabled.
    #[shaku(default)]
    pool: Option<Arc<Pool>>,
}

impl RedisStoreClient {
    /// Create a new Redis store client.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Create a client that stores nothing (for when the store is disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    async fn get_conn(&self) -> BazaarResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool
                .get()
                .await
                .map_err(|e| BazaarError::store(format!("Failed to get store connection: {}", e))),
            None => Err(BazaarError::store("Store is disabled")),
        }
    }
}

/// Turn a stored value into a payload string.
///
/// Values written by other producers need not be UTF-8. Invalid sequences are
/// replaced so the read still returns the raw payload.
fn payload_from_bytes(key: &str, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Value for key '{}' is not valid UTF-8, reading it lossily", key);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

#[async_trait]
impl StoreClient for RedisStoreClient {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> BazaarResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let bytes: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| BazaarError::store(format!("Failed to get key '{}': {}", key, e)))?;
        let value = bytes.map(|bytes| payload_from_bytes(key, bytes));

        match &value {
            Some(_) => debug!("Store hit for key '{}'", key),
            None => debug!("Store miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, payload: &str, ttl: Duration) -> BazaarResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;

        if ttl.is_zero() {
            conn.set::<_, _, ()>(key, payload)
                .await
                .map_err(|e| BazaarError::store(format!("Failed to set key '{}': {}", key, e)))?;
            debug!("Stored key '{}' without expiry", key);
        } else {
            // Sub-second TTLs round up so they never turn into "no expiry".
            let ttl_secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
            conn.set_ex::<_, _, ()>(key, payload, ttl_secs)
                .await
                .map_err(|e| BazaarError::store(format!("Failed to set key '{}': {}", key, e)))?;
            debug!("Stored key '{}' with TTL {}s", key, ttl_secs);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> BazaarResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| BazaarError::store(format!("Failed to delete key '{}': {}", key, e)))?;

        debug!("Deleted key '{}': {}", key, deleted > 0);
        Ok(deleted > 0)
    }

    async fn flush(&self) -> BazaarResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        deadpool_redis::redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| BazaarError::store(format!("Failed to flush store: {}", e)))?;

        info!("Flushed key-value store");
        Ok(())
    }

    async fn ping(&self) -> BazaarResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        deadpool_redis::redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| BazaarError::store(format!("Store ping failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl HealthCheck for RedisStoreClient {
    fn name(&self) -> &str {
        "key-value-store"
    }

    async fn check(&self) -> HealthStatus {
        if !self.is_enabled() {
            return HealthStatus::Degraded("Store is disabled".to_string());
        }
        match self.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}
