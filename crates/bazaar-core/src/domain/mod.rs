//! Catalog entities held by the authoritative store and snapshotted into the cache.

mod category;
mod product;

pub use category::*;
pub use product::*;
