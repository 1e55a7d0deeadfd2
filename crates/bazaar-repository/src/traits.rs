//! Repository trait definitions.

use bazaar_core::{
    BazaarResult, Category, CategoryId, Interface, NewCategory, NewProduct, Product, ProductId,
};
use async_trait::async_trait;

/// Product repository trait.
#[async_trait]
pub trait ProductRepository: Interface + Send + Sync {
    /// Finds every product.
    async fn find_all(&self) -> BazaarResult<Vec<Product>>;

    /// Finds a product by ID.
    async fn find_by_id(&self, id: ProductId) -> BazaarResult<Option<Product>>;

    /// Finds the products of one category.
    async fn find_by_category(&self, category_id: CategoryId) -> BazaarResult<Vec<Product>>;

    /// Persists a new product and returns it with its assigned id.
    async fn save(&self, product: NewProduct) -> BazaarResult<Product>;

    /// Replaces an existing product.
    async fn update(&self, product: &Product) -> BazaarResult<Product>;

    /// Deletes a product by ID. Returns `false` if it did not exist.
    async fn delete(&self, id: ProductId) -> BazaarResult<bool>;
}

/// Category repository trait.
#[async_trait]
pub trait CategoryRepository: Interface + Send + Sync {
    /// Finds every category.
    async fn find_all(&self) -> BazaarResult<Vec<Category>>;

    /// Finds a category by ID.
    async fn find_by_id(&self, id: CategoryId) -> BazaarResult<Option<Category>>;

    /// Persists a new category and returns it with its assigned id.
    async fn save(&self, category: NewCategory) -> BazaarResult<Category>;

    /// Replaces an existing category.
    async fn update(&self, category: &Category) -> BazaarResult<Category>;

    /// Deletes a category by ID. Returns `false` if it did not exist.
    async fn delete(&self, id: CategoryId) -> BazaarResult<bool>;
}
