//! Cache inspection and maintenance.

use crate::cache::{cache_keys, KeyRegistry, StoreClient, StoreExt};
use crate::catalog::{CategoryService, ProductService};
use bazaar_core::{BazaarError, BazaarResult};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Snapshot of what the cache currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub products_all_cached: bool,
    pub categories_all_cached: bool,
    /// Tracked keys that still hold a value.
    pub cached_keys: Vec<String>,
}

/// Timing of two consecutive identical reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadTiming {
    /// First read, normally a miss served by the repository.
    pub first: Duration,
    /// Second read, normally a hit.
    pub second: Duration,
}

impl ReadTiming {
    /// How much faster the second read was, in whole percent of the first.
    #[must_use]
    pub fn improvement_percent(&self) -> i64 {
        let first = self.first.as_secs_f64();
        if first == 0.0 {
            return 0;
        }
        (((first - self.second.as_secs_f64()) / first) * 100.0).round() as i64
    }
}

/// Operator-facing cache maintenance.
pub struct CacheAdminService {
    store: Arc<dyn StoreClient>,
    registry: Arc<dyn KeyRegistry>,
    products: Arc<dyn ProductService>,
    categories: Arc<dyn CategoryService>,
    default_ttl: Duration,
}

impl CacheAdminService {
    /// Creates a new cache admin service.
    #[must_use]
    pub fn new(
        store: Arc<dyn StoreClient>,
        registry: Arc<dyn KeyRegistry>,
        products: Arc<dyn ProductService>,
        categories: Arc<dyn CategoryService>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            products,
            categories,
            default_ttl,
        }
    }

    /// Remove every entry from the store and forget every tracked key.
    ///
    /// Sessions and tokens are stored alongside cached data and are removed too.
    pub async fn flush(&self) -> BazaarResult<()> {
        self.store.flush().await?;
        self.registry.clear().await;
        info!("Cache flushed");
        Ok(())
    }

    /// Report which listings are cached and which tracked keys are live.
    pub async fn status(&self) -> BazaarResult<CacheStatus> {
        let products_all_cached = self.store.get_raw(cache_keys::PRODUCTS_ALL).await?.is_some();
        let categories_all_cached = self
            .store
            .get_raw(cache_keys::CATEGORIES_ALL)
            .await?
            .is_some();
        let cached_keys = self.registry.list_live().await?;

        Ok(CacheStatus {
            products_all_cached,
            categories_all_cached,
            cached_keys,
        })
    }

    /// Store an arbitrary value under `key` and track it.
    ///
    /// `ttl` defaults to the entity cache TTL.
    pub async fn set_custom(&self, key: &str, value: &Value, ttl: Option<Duration>) -> BazaarResult<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(BazaarError::Validation("Cache key must not be empty".to_string()));
        }
        if key == cache_keys::REGISTRY_KEY {
            return Err(BazaarError::Validation(format!("Cache key '{}' is reserved", key)));
        }

        self.store
            .set(key, value, ttl.unwrap_or(self.default_ttl))
            .await?;
        self.registry.track(key).await;
        info!("Cache set for key: {}", key);
        Ok(())
    }

    /// Read an arbitrary value.
    pub async fn get_custom(&self, key: &str) -> BazaarResult<Option<Value>> {
        self.store.get_value(key).await
    }

    /// Time two consecutive product listings.
    pub async fn time_product_reads(&self) -> BazaarResult<ReadTiming> {
        time_twice(|| self.products.find_all()).await
    }

    /// Time two consecutive category listings.
    pub async fn time_category_reads(&self) -> BazaarResult<ReadTiming> {
        time_twice(|| self.categories.find_all()).await
    }
}

async fn time_twice<T, F, Fut>(mut read: F) -> BazaarResult<ReadTiming>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BazaarResult<T>>,
{
    let started = Instant::now();
    read().await?;
    let first = started.elapsed();

    let started = Instant::now();
    read().await?;
    let second = started.elapsed();

    Ok(ReadTiming { first, second })
}
