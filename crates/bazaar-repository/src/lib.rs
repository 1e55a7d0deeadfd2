//! # Bazaar Repository
//!
//! The authoritative side of the catalog. Services read from and write to
//! these repositories; the cache only ever holds snapshots of what they return
//! and is never consulted from here.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn ProductRepository> / Arc<dyn CategoryRepository>
//! InMemoryProductRepository / InMemoryCategoryRepository
//! ```

pub mod memory;
pub mod traits;

pub use memory::*;
pub use traits::*;
