//! In-memory category repository.

use crate::CategoryRepository;
use async_trait::async_trait;
use bazaar_core::{BazaarError, BazaarResult, Category, CategoryId, NewCategory};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/// Category repository backed by an ordered map.
#[derive(Debug, Default)]
pub struct InMemoryCategoryRepository {
    rows: RwLock<Rows>,
}

#[derive(Debug, Default)]
struct Rows {
    next_id: i64,
    categories: BTreeMap<CategoryId, Category>,
}

impl InMemoryCategoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_all(&self) -> BazaarResult<Vec<Category>> {
        Ok(self.rows.read().categories.values().cloned().collect())
    }

    async fn find_by_id(&self, id: CategoryId) -> BazaarResult<Option<Category>> {
        Ok(self.rows.read().categories.get(&id).cloned())
    }

    async fn save(&self, category: NewCategory) -> BazaarResult<Category> {
        let mut rows = self.rows.write();
        rows.next_id += 1;
        let category = Category::from_new(CategoryId(rows.next_id), category);
        rows.categories.insert(category.id, category.clone());
        debug!("Inserted category {}", category.id);
        Ok(category)
    }

    async fn update(&self, category: &Category) -> BazaarResult<Category> {
        let mut rows = self.rows.write();
        match rows.categories.get_mut(&category.id) {
            Some(row) => {
                *row = category.clone();
                Ok(category.clone())
            }
            None => Err(BazaarError::not_found("Category", category.id)),
        }
    }

    async fn delete(&self, id: CategoryId) -> BazaarResult<bool> {
        Ok(self.rows.write().categories.remove(&id).is_some())
    }
}
