//! In-memory product repository.

use crate::ProductRepository;
use async_trait::async_trait;
use bazaar_core::{BazaarError, BazaarResult, CategoryId, NewProduct, Product, ProductId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/// Product repository backed by an ordered map.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    rows: RwLock<Rows>,
}

#[derive(Debug, Default)]
struct Rows {
    next_id: i64,
    products: BTreeMap<ProductId, Product>,
}

impl InMemoryProductRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().products.len()
    }

    /// Returns true if no products are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().products.is_empty()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_all(&self) -> BazaarResult<Vec<Product>> {
        Ok(self.rows.read().products.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ProductId) -> BazaarResult<Option<Product>> {
        Ok(self.rows.read().products.get(&id).cloned())
    }

    async fn find_by_category(&self, category_id: CategoryId) -> BazaarResult<Vec<Product>> {
        Ok(self
            .rows
            .read()
            .products
            .values()
            .filter(|p| p.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn save(&self, product: NewProduct) -> BazaarResult<Product> {
        let mut rows = self.rows.write();
        rows.next_id += 1;
        let product = Product::from_new(ProductId(rows.next_id), product);
        rows.products.insert(product.id, product.clone());
        debug!("Inserted product {}", product.id);
        Ok(product)
    }

    async fn update(&self, product: &Product) -> BazaarResult<Product> {
        let mut rows = self.rows.write();
        match rows.products.get_mut(&product.id) {
            Some(row) => {
                *row = product.clone();
                Ok(product.clone())
            }
            None => Err(BazaarError::not_found("Product", product.id)),
        }
    }

    async fn delete(&self, id: ProductId) -> BazaarResult<bool> {
        Ok(self.rows.write().products.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_increment_from_one() {
        let repo = InMemoryProductRepository::new();
        let a = repo.save(NewProduct::new("A", 1.0, 1, CategoryId(1))).await.unwrap();
        let b = repo.save(NewProduct::new("B", 2.0, 1, CategoryId(2))).await.unwrap();
        assert_eq!(a.id, ProductId(1));
        assert_eq!(b.id, ProductId(2));
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_category_filters() {
        let repo = InMemoryProductRepository::new();
        repo.save(NewProduct::new("A", 1.0, 1, CategoryId(1))).await.unwrap();
        repo.save(NewProduct::new("B", 2.0, 1, CategoryId(2))).await.unwrap();

        let found = repo.find_by_category(CategoryId(2)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "B");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = InMemoryProductRepository::new();
        let ghost = Product::from_new(ProductId(99), NewProduct::new("Ghost", 1.0, 0, CategoryId(1)));
        let result = repo.update(&ghost).await;
        assert!(matches!(result, Err(BazaarError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let repo = InMemoryProductRepository::new();
        let p = repo.save(NewProduct::new("A", 1.0, 1, CategoryId(1))).await.unwrap();
        assert!(repo.delete(p.id).await.unwrap());
        assert!(!repo.delete(p.id).await.unwrap());
        assert!(repo.is_empty());
    }
}
