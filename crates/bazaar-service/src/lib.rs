//! # Bazaar Service
//!
//! Caching and session layer for the Bazaar catalog.
//!
//! - [`cache`]: the key-value store client, the tracked-key registry and the
//!   cache-aside coordinator.
//! - [`session`]: sliding-expiration sessions, single-use tokens and the
//!   session gate consulted by request guards.
//! - [`catalog`]: product and category services built on cache-aside.
//! - [`admin`]: cache inspection and maintenance.
//! - [`di`]: the shaku module wiring the store-facing components.

pub mod admin;
pub mod cache;
pub mod catalog;
pub mod di;
pub mod session;

pub use admin::*;
pub use cache::*;
pub use catalog::*;
pub use di::*;
pub use session::*;
