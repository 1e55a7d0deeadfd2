//! Result type aliases for Bazaar.

use crate::BazaarError;

/// A specialized `Result` type for Bazaar operations.
pub type BazaarResult<T> = Result<T, BazaarError>;
