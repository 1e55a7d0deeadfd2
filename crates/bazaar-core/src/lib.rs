//! # Bazaar Core
//!
//! Core types, traits, and error definitions for Bazaar.
//! Every other crate in the workspace builds on the error type, the typed ids
//! and the catalog entities defined here.

pub mod domain;
pub mod error;
pub mod id;
pub mod result;
pub mod telemetry;
pub mod traits;

pub use domain::*;
pub use error::*;
pub use id::*;
pub use result::*;
pub use telemetry::TelemetryConfig;
pub use traits::*;

// Re-export shaku for dependency injection
pub use shaku::{module, HasComponent, Interface};
