//! In-process repositories.
//!
//! Ids are assigned from 1 upward in insertion order, like an auto-increment
//! column, and listings come back ordered by id.

mod category;
mod product;

pub use category::InMemoryCategoryRepository;
pub use product::InMemoryProductRepository;
