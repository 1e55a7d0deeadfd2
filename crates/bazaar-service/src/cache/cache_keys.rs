//! Cache key generators for consistent key naming.
//!
//! Other services read and write these keys directly, so the formats are fixed.

use crate::session::TokenKind;
use bazaar_core::{CategoryId, ProductId, SessionId};

/// Key under which the registry persists its own key set.
pub const REGISTRY_KEY: &str = "__tracked_keys__";

/// Key holding the snapshot of every product.
pub const PRODUCTS_ALL: &str = "products_all";

/// Key holding the snapshot of every category.
pub const CATEGORIES_ALL: &str = "categories_all";

/// Generate a cache key for a product by ID.
#[must_use]
pub fn product(id: ProductId) -> String {
    format!("product_{}", id)
}

/// Generate the key for the product listing of one category.
#[must_use]
pub fn products_by_category(category_id: CategoryId) -> String {
    format!("products_by_category_{}", category_id)
}

/// Generate a cache key for a category by ID.
#[must_use]
pub fn category(id: CategoryId) -> String {
    format!("category_{}", id)
}

/// Generate the key of a session record.
#[must_use]
pub fn session(id: &SessionId) -> String {
    format!("session:{}", id)
}

/// Generate the key of a single-use token.
#[must_use]
pub fn token(kind: TokenKind, token: &str) -> String {
    format!("{}:{}", kind.prefix(), token)
}
