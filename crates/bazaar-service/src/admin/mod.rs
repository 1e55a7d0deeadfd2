//! Operator tooling for the cache.

mod cache_admin;

pub use cache_admin::{CacheAdminService, CacheStatus, ReadTiming};
