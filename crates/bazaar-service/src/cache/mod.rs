//! Caching infrastructure for the service layer.
//!
//! This module provides a key-value store abstraction with a Redis and an
//! in-process implementation, the registry of keys the application believes
//! are live, and the cache-aside coordinator used by the catalog services.

mod cache_aside;
pub mod cache_keys;
mod memory_store;
mod redis_store;
mod registry;
mod store_client;

pub use cache_aside::{CacheAside, InvalidationPolicy, InvalidationReport};
pub use memory_store::{MemoryStoreClient, MemoryStoreStats};
pub use redis_store::{create_pool, RedisStoreClient, RedisStoreClientParameters};
pub use registry::{KeyRegistry, NoopKeyRegistry, TrackedKeyRegistry, TrackedKeyRegistryParameters};
pub use store_client::{decode_payload, encode_payload, StoreClient, StoreExt, NO_EXPIRY};
