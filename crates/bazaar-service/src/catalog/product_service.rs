//! Product service with cache-aside reads.

use crate::cache::{cache_keys, CacheAside};
use async_trait::async_trait;
use bazaar_core::{
    BazaarError, BazaarResult, CategoryId, Interface, NewProduct, Product, ProductChanges,
    ProductId,
};
use bazaar_repository::ProductRepository;
use std::sync::Arc;
use tracing::{debug, info};

/// Product service trait.
#[async_trait]
pub trait ProductService: Interface + Send + Sync {
    /// Lists every product.
    async fn find_all(&self) -> BazaarResult<Vec<Product>>;

    /// Gets a product by ID.
    async fn find_one(&self, id: ProductId) -> BazaarResult<Product>;

    /// Lists the products of one category.
    async fn find_by_category(&self, category_id: CategoryId) -> BazaarResult<Vec<Product>>;

    /// Creates a product.
    async fn create(&self, product: NewProduct) -> BazaarResult<Product>;

    /// Applies a partial update to a product.
    async fn update(&self, id: ProductId, changes: ProductChanges) -> BazaarResult<Product>;

    /// Deletes a product.
    async fn remove(&self, id: ProductId) -> BazaarResult<()>;
}

/// Product service reading through the cache.
pub struct ProductServiceImpl {
    repository: Arc<dyn ProductRepository>,
    cache: CacheAside,
}

impl ProductServiceImpl {
    /// Creates a new product service.
    #[must_use]
    pub fn new(repository: Arc<dyn ProductRepository>, cache: CacheAside) -> Self {
        Self { repository, cache }
    }

    async fn load(&self, id: ProductId) -> BazaarResult<Product> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| BazaarError::not_found("Product", id))
    }
}

#[async_trait]
impl ProductService for ProductServiceImpl {
    async fn find_all(&self) -> BazaarResult<Vec<Product>> {
        self.cache
            .read_through(cache_keys::PRODUCTS_ALL, || self.repository.find_all())
            .await
    }

    async fn find_one(&self, id: ProductId) -> BazaarResult<Product> {
        debug!("Getting product: {}", id);
        self.cache
            .read_through(&cache_keys::product(id), || self.load(id))
            .await
    }

    async fn find_by_category(&self, category_id: CategoryId) -> BazaarResult<Vec<Product>> {
        self.cache
            .read_through(&cache_keys::products_by_category(category_id), || {
                self.repository.find_by_category(category_id)
            })
            .await
    }

    async fn create(&self, product: NewProduct) -> BazaarResult<Product> {
        debug!("Creating product: {}", product.name);

        let saved = self.repository.save(product).await?;

        self.cache
            .invalidate([
                cache_keys::PRODUCTS_ALL.to_string(),
                cache_keys::products_by_category(saved.category_id),
            ])
            .await;

        info!("Product created: {}", saved.id);
        Ok(saved)
    }

    async fn update(&self, id: ProductId, changes: ProductChanges) -> BazaarResult<Product> {
        debug!("Updating product: {}", id);

        // The previous category comes from the repository, never from a cached copy.
        let mut product = self.load(id).await?;
        let previous_category = product.category_id;

        product.apply(changes);
        let updated = self.repository.update(&product).await?;

        let mut keys = vec![
            cache_keys::product(id),
            cache_keys::PRODUCTS_ALL.to_string(),
            cache_keys::products_by_category(previous_category),
        ];
        if updated.category_id != previous_category {
            keys.push(cache_keys::products_by_category(updated.category_id));
        }
        self.cache.invalidate(keys).await;

        info!("Product updated: {}", id);
        Ok(updated)
    }

    async fn remove(&self, id: ProductId) -> BazaarResult<()> {
        debug!("Deleting product: {}", id);

        let product = self.load(id).await?;
        if !self.repository.delete(id).await? {
            return Err(BazaarError::not_found("Product", id));
        }

        self.cache
            .invalidate([
                cache_keys::product(id),
                cache_keys::PRODUCTS_ALL.to_string(),
                cache_keys::products_by_category(product.category_id),
            ])
            .await;

        info!("Product deleted: {}", id);
        Ok(())
    }
}

impl std::fmt::Debug for ProductServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStoreClient, NoopKeyRegistry, StoreClient, StoreExt, TrackedKeyRegistry};
    use bazaar_repository::InMemoryProductRepository;
    use mockall::mock;
    use std::time::Duration;

    mock! {
        Repo {}

        #[async_trait]
        impl ProductRepository for Repo {
            async fn find_all(&self) -> BazaarResult<Vec<Product>>;
            async fn find_by_id(&self, id: ProductId) -> BazaarResult<Option<Product>>;
            async fn find_by_category(&self, category_id: CategoryId) -> BazaarResult<Vec<Product>>;
            async fn save(&self, product: NewProduct) -> BazaarResult<Product>;
            async fn update(&self, product: &Product) -> BazaarResult<Product>;
            async fn delete(&self, id: ProductId) -> BazaarResult<bool>;
        }
    }

    struct Fixture {
        store: Arc<MemoryStoreClient>,
        repository: Arc<InMemoryProductRepository>,
        service: ProductServiceImpl,
    }

    fn setup() -> Fixture {
        let store = Arc::new(MemoryStoreClient::new());
        let registry = Arc::new(TrackedKeyRegistry::new(store.clone()));
        let repository = Arc::new(InMemoryProductRepository::default());
        let cache = CacheAside::new(store.clone(), registry, Duration::from_secs(3600));
        let service = ProductServiceImpl::new(repository.clone(), cache);
        Fixture {
            store,
            repository,
            service,
        }
    }

    #[tokio::test]
    async fn test_find_one_caches_product() {
        let f = setup();
        let created = f
            .service
            .create(NewProduct::new("Lamp", 19.5, 4, CategoryId(1)))
            .await
            .unwrap();

        let found = f.service.find_one(created.id).await.unwrap();
        assert_eq!(found, created);

        let cached: Option<Product> = f.store.get(&format!("product_{}", created.id)).await.unwrap();
        assert_eq!(cached, Some(created));
    }

    #[tokio::test]
    async fn test_find_one_missing_is_not_found_and_uncached() {
        let f = setup();
        let err = f.service.find_one(ProductId(99)).await.unwrap_err();
        assert!(matches!(err, BazaarError::NotFound { .. }));
        assert!(!f.store.contains("product_99"));
    }

    #[tokio::test]
    async fn test_create_invalidates_listings() {
        let f = setup();
        f.service
            .create(NewProduct::new("Chair", 40.0, 2, CategoryId(1)))
            .await
            .unwrap();
        assert_eq!(f.service.find_all().await.unwrap().len(), 1);
        assert_eq!(f.service.find_by_category(CategoryId(1)).await.unwrap().len(), 1);

        f.service
            .create(NewProduct::new("Table", 90.0, 1, CategoryId(1)))
            .await
            .unwrap();

        assert!(!f.store.contains("products_all"));
        assert!(!f.store.contains("products_by_category_1"));
        assert_eq!(f.service.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_moving_category_invalidates_both_listings() {
        let f = setup();
        let product = f
            .service
            .create(NewProduct::new("Desk", 120.0, 3, CategoryId(1)))
            .await
            .unwrap();
        f.service.find_one(product.id).await.unwrap();
        f.service.find_by_category(CategoryId(1)).await.unwrap();
        f.service.find_by_category(CategoryId(2)).await.unwrap();

        let moved = f
            .service
            .update(product.id, ProductChanges::move_to(CategoryId(2)))
            .await
            .unwrap();

        assert_eq!(moved.category_id, CategoryId(2));
        assert!(!f.store.contains(&format!("product_{}", product.id)));
        assert!(!f.store.contains("products_by_category_1"));
        assert!(!f.store.contains("products_by_category_2"));
        assert!(f.service.find_by_category(CategoryId(1)).await.unwrap().is_empty());
        assert_eq!(f.service.find_by_category(CategoryId(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let f = setup();
        let err = f
            .service
            .update(ProductId(5), ProductChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BazaarError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_clears_cached_copies() {
        let f = setup();
        let product = f
            .service
            .create(NewProduct::new("Rug", 60.0, 1, CategoryId(3)))
            .await
            .unwrap();
        f.service.find_one(product.id).await.unwrap();

        f.service.remove(product.id).await.unwrap();

        assert!(f.repository.is_empty());
        assert!(matches!(
            f.service.find_one(product.id).await,
            Err(BazaarError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_survives_store_outage() {
        let f = setup();
        f.store.set_online(false);

        let saved = f
            .service
            .create(NewProduct::new("Vase", 12.0, 9, CategoryId(2)))
            .await
            .unwrap();

        assert_eq!(f.repository.len(), 1);
        assert_eq!(saved.name, "Vase");
        assert!(f.store.ping().await.is_err());
    }

    fn kettle(category_id: CategoryId) -> Product {
        Product::from_new(ProductId(1), NewProduct::new("Kettle", 35.0, 6, category_id))
    }

    #[tokio::test]
    async fn test_failed_update_leaves_cache_untouched() {
        let mut repo = MockRepo::new();
        repo.expect_find_by_id()
            .times(1)
            .returning(|_| Ok(Some(kettle(CategoryId(1)))));
        repo.expect_update()
            .times(1)
            .returning(|_| Err(BazaarError::Database("write timeout".to_string())));

        let store = Arc::new(MemoryStoreClient::new());
        store
            .set("product_1", &kettle(CategoryId(1)), Duration::from_secs(60))
            .await
            .unwrap();
        let cache = CacheAside::new(store.clone(), Arc::new(NoopKeyRegistry), Duration::from_secs(60));
        let service = ProductServiceImpl::new(Arc::new(repo), cache);

        let err = service
            .update(ProductId(1), ProductChanges::move_to(CategoryId(2)))
            .await
            .unwrap_err();

        assert!(matches!(err, BazaarError::Database(_)));
        assert!(store.contains("product_1"));
    }

    #[tokio::test]
    async fn test_update_uses_repository_category_not_cached_copy() {
        let mut repo = MockRepo::new();
        repo.expect_find_by_id()
            .times(1)
            .returning(|_| Ok(Some(kettle(CategoryId(1)))));
        repo.expect_update().times(1).returning(|p| Ok(p.clone()));

        let store = Arc::new(MemoryStoreClient::new());
        // A stale cached copy claiming the product lives in category 7.
        store
            .set("product_1", &kettle(CategoryId(7)), Duration::from_secs(60))
            .await
            .unwrap();
        for key in ["products_by_category_1", "products_by_category_2", "products_by_category_7"] {
            store.set_raw(key, "[]", Duration::from_secs(60)).await.unwrap();
        }
        let cache = CacheAside::new(store.clone(), Arc::new(NoopKeyRegistry), Duration::from_secs(60));
        let service = ProductServiceImpl::new(Arc::new(repo), cache);

        service
            .update(ProductId(1), ProductChanges::move_to(CategoryId(2)))
            .await
            .unwrap();

        assert!(!store.contains("product_1"));
        assert!(!store.contains("products_by_category_1"));
        assert!(!store.contains("products_by_category_2"));
        assert!(store.contains("products_by_category_7"));
    }
}
