//! Common test infrastructure for service integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bazaar_config::CacheConfig;
use bazaar_core::{BazaarResult, CategoryId, NewProduct, Product, ProductId};
use bazaar_repository::{InMemoryCategoryRepository, InMemoryProductRepository, ProductRepository};
use bazaar_service::{CacheModule, MemoryStoreClient, Services, StoreClient};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Product repository that counts reads reaching the authoritative store.
#[derive(Default)]
pub struct CountingProductRepository {
    inner: InMemoryProductRepository,
    reads: AtomicUsize,
}

impl CountingProductRepository {
    /// Number of read calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductRepository for CountingProductRepository {
    async fn find_all(&self) -> BazaarResult<Vec<Product>> {
        self.record_read();
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: ProductId) -> BazaarResult<Option<Product>> {
        self.record_read();
        self.inner.find_by_id(id).await
    }

    async fn find_by_category(&self, category_id: CategoryId) -> BazaarResult<Vec<Product>> {
        self.record_read();
        self.inner.find_by_category(category_id).await
    }

    async fn save(&self, product: NewProduct) -> BazaarResult<Product> {
        self.inner.save(product).await
    }

    async fn update(&self, product: &Product) -> BazaarResult<Product> {
        self.inner.update(product).await
    }

    async fn delete(&self, id: ProductId) -> BazaarResult<bool> {
        self.inner.delete(id).await
    }
}

/// Services wired to an in-process store.
pub struct TestHarness {
    pub store: Arc<MemoryStoreClient>,
    pub products: Arc<CountingProductRepository>,
    pub module: CacheModule,
    pub services: Services,
}

/// Store handle that lets the harness keep a typed reference to the store
/// injected into the module.
struct SharedStore(Arc<MemoryStoreClient>);

#[async_trait]
impl StoreClient for SharedStore {
    async fn get_raw(&self, key: &str) -> BazaarResult<Option<String>> {
        self.0.get_raw(key).await
    }

    async fn set_raw(&self, key: &str, payload: &str, ttl: std::time::Duration) -> BazaarResult<()> {
        self.0.set_raw(key, payload, ttl).await
    }

    async fn delete(&self, key: &str) -> BazaarResult<bool> {
        self.0.delete(key).await
    }

    async fn flush(&self) -> BazaarResult<()> {
        self.0.flush().await
    }

    async fn ping(&self) -> BazaarResult<()> {
        self.0.ping().await
    }

    fn is_enabled(&self) -> bool {
        self.0.is_enabled()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(CacheConfig {
            invalidation_backoff_ms: 1,
            ..CacheConfig::default()
        })
    }

    pub fn with_config(cache_config: CacheConfig) -> Self {
        let store = Arc::new(MemoryStoreClient::new());
        let products = Arc::new(CountingProductRepository::default());

        let module = CacheModule::builder()
            .with_component_override::<dyn StoreClient>(Box::new(SharedStore(store.clone())))
            .build();

        let services = Services::assemble(
            &module,
            products.clone(),
            Arc::new(InMemoryCategoryRepository::new()),
            &cache_config,
        );

        Self {
            store,
            products,
            module,
            services,
        }
    }
}
