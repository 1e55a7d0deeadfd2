//! Cache-aside coordination for read and write paths.

use super::{KeyRegistry, StoreClient, StoreExt};
use bazaar_config::CacheConfig;
use bazaar_core::BazaarResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry schedule for cache invalidation.
#[derive(Debug, Clone)]
pub struct InvalidationPolicy {
    /// Maximum delete attempts per key, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for InvalidationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl InvalidationPolicy {
    /// Policy that gives up after the first failure.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Calculates the delay before a given attempt (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let base_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        Duration::from_millis(base_ms.min(self.max_delay.as_millis() as f64) as u64)
    }
}

impl From<&CacheConfig> for InvalidationPolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            max_attempts: config.invalidation_attempts.max(1),
            initial_delay: config.invalidation_backoff(),
            ..Default::default()
        }
    }
}

/// Outcome of invalidating a batch of keys.
///
/// Invalidation never fails the write that triggered it; keys that could not
/// be deleted are reported here and stay cached until their TTL runs out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    /// Keys confirmed gone from the store.
    pub cleared: Vec<String>,
    /// Keys whose delete failed on every attempt.
    pub failed: Vec<String>,
}

impl InvalidationReport {
    /// Returns `true` if every key was cleared.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Coordinates cache-aside reads and invalidation-on-write.
///
/// Reads go to the store first and fall back to a loader on a miss, writing
/// the loaded value back with the default TTL. Writes are followed by deleting
/// every key that could hold a copy of the changed data.
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn StoreClient>,
    registry: Arc<dyn KeyRegistry>,
    ttl: Duration,
    policy: InvalidationPolicy,
}

impl CacheAside {
    /// Create a coordinator with the default invalidation policy.
    #[must_use]
    pub fn new(store: Arc<dyn StoreClient>, registry: Arc<dyn KeyRegistry>, ttl: Duration) -> Self {
        Self {
            store,
            registry,
            ttl,
            policy: InvalidationPolicy::default(),
        }
    }

    /// Create a coordinator from the cache configuration.
    #[must_use]
    pub fn from_config(
        store: Arc<dyn StoreClient>,
        registry: Arc<dyn KeyRegistry>,
        config: &CacheConfig,
    ) -> Self {
        Self::new(store, registry, config.default_ttl()).with_policy(InvalidationPolicy::from(config))
    }

    /// Replace the invalidation policy.
    #[must_use]
    pub fn with_policy(mut self, policy: InvalidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// TTL applied to values written on a miss.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The store this coordinator reads from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    /// The registry this coordinator records keys in.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn KeyRegistry> {
        &self.registry
    }

    /// Return the cached value for `key`, loading and caching it on a miss.
    ///
    /// The loader is not called on a hit. Loader errors are returned as is and
    /// leave nothing cached. A store failure on either the read or the
    /// write-back fails the call.
    pub async fn read_through<T, F, Fut>(&self, key: &str, load: F) -> BazaarResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = BazaarResult<T>> + Send,
    {
        if let Some(cached) = self.store.get::<T>(key).await? {
            debug!("Cache hit for '{}'", key);
            return Ok(cached);
        }

        debug!("Cache miss for '{}', loading from source", key);
        let value = load().await?;

        self.store.set(key, &value, self.ttl).await?;
        self.registry.track(key).await;

        Ok(value)
    }

    /// Delete every listed key, retrying transient store failures.
    ///
    /// Duplicates are deleted once, in first-seen order. Each cleared key is
    /// also removed from the registry.
    pub async fn invalidate<I>(&self, keys: I) -> InvalidationReport
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = Vec::new();
        for key in keys {
            if !seen.contains(&key) {
                seen.push(key);
            }
        }

        let mut report = InvalidationReport::default();
        for key in seen {
            if self.delete_with_retry(&key).await {
                self.registry.untrack(&key).await;
                report.cleared.push(key);
            } else {
                report.failed.push(key);
            }
        }

        if !report.is_complete() {
            warn!(
                "Cache invalidation incomplete, {} keys may serve stale data until expiry: {:?}",
                report.failed.len(),
                report.failed
            );
        }

        report
    }

    async fn delete_with_retry(&self, key: &str) -> bool {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.policy.delay_for_attempt(attempt);
                debug!("Retrying delete of '{}' after {:?}", key, delay);
                tokio::time::sleep(delay).await;
            }

            match self.store.delete(key).await {
                Ok(_) => return true,
                Err(e) if e.is_retriable() => {
                    debug!("Delete attempt {} for '{}' failed: {}", attempt + 1, key, e);
                }
                Err(e) => {
                    warn!("Delete of '{}' failed permanently: {}", key, e);
                    return false;
                }
            }
        }

        false
    }
}
