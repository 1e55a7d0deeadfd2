//! Category service with cache-aside reads.

use crate::cache::{cache_keys, CacheAside};
use async_trait::async_trait;
use bazaar_core::{
    BazaarError, BazaarResult, Category, CategoryChanges, CategoryId, Interface, NewCategory,
};
use bazaar_repository::CategoryRepository;
use std::sync::Arc;
use tracing::{debug, info};

/// Category service trait.
#[async_trait]
pub trait CategoryService: Interface + Send + Sync {
    /// Lists every category.
    async fn find_all(&self) -> BazaarResult<Vec<Category>>;

    /// Gets a category by ID.
    async fn find_one(&self, id: CategoryId) -> BazaarResult<Category>;

    /// Creates a category.
    async fn create(&self, category: NewCategory) -> BazaarResult<Category>;

    /// Applies a partial update to a category.
    async fn update(&self, id: CategoryId, changes: CategoryChanges) -> BazaarResult<Category>;

    /// Deletes a category.
    async fn remove(&self, id: CategoryId) -> BazaarResult<()>;
}

/// Category service reading through the cache.
pub struct CategoryServiceImpl {
    repository: Arc<dyn CategoryRepository>,
    cache: CacheAside,
}

impl CategoryServiceImpl {
    /// Creates a new category service.
    #[must_use]
    pub fn new(repository: Arc<dyn CategoryRepository>, cache: CacheAside) -> Self {
        Self { repository, cache }
    }

    async fn load(&self, id: CategoryId) -> BazaarResult<Category> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| BazaarError::not_found("Category", id))
    }

    fn affected_keys(id: CategoryId) -> [String; 2] {
        [cache_keys::category(id), cache_keys::CATEGORIES_ALL.to_string()]
    }
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn find_all(&self) -> BazaarResult<Vec<Category>> {
        self.cache
            .read_through(cache_keys::CATEGORIES_ALL, || self.repository.find_all())
            .await
    }

    async fn find_one(&self, id: CategoryId) -> BazaarResult<Category> {
        debug!("Getting category: {}", id);
        self.cache
            .read_through(&cache_keys::category(id), || self.load(id))
            .await
    }

    async fn create(&self, category: NewCategory) -> BazaarResult<Category> {
        debug!("Creating category: {}", category.name);

        let saved = self.repository.save(category).await?;
        self.cache.invalidate(Self::affected_keys(saved.id)).await;

        info!("Category created: {}", saved.id);
        Ok(saved)
    }

    async fn update(&self, id: CategoryId, changes: CategoryChanges) -> BazaarResult<Category> {
        debug!("Updating category: {}", id);

        let mut category = self.load(id).await?;
        category.apply(changes);
        let updated = self.repository.update(&category).await?;

        self.cache.invalidate(Self::affected_keys(id)).await;

        info!("Category updated: {}", id);
        Ok(updated)
    }

    async fn remove(&self, id: CategoryId) -> BazaarResult<()> {
        debug!("Deleting category: {}", id);

        if !self.repository.delete(id).await? {
            return Err(BazaarError::not_found("Category", id));
        }
        self.cache.invalidate(Self::affected_keys(id)).await;

        info!("Category deleted: {}", id);
        Ok(())
    }
}

impl std::fmt::Debug for CategoryServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryServiceImpl").finish_non_exhaustive()
    }
}
