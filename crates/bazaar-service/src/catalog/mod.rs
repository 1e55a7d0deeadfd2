//! Catalog services.
//!
//! Reads go through [`CacheAside`](crate::cache::CacheAside) under the shared
//! key scheme; writes go to the repository first and then invalidate every key
//! that could hold a copy of the changed row.

mod category_service;
mod product_service;

pub use category_service::{CategoryService, CategoryServiceImpl};
pub use product_service::{ProductService, ProductServiceImpl};
