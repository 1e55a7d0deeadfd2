//! Unified error types for all layers of the application.

use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for all layers of Bazaar.
///
/// Cache misses, expired sessions and consumed tokens are never errors: they
/// surface as `None` from the operation that observed them. Errors are
/// reserved for transport failures, domain lookups that came back empty from
/// the authoritative store, and rejected authentication.
#[derive(Error, Debug)]
pub enum BazaarError {
    // ============ Domain Errors ============
    /// Resource not found in the authoritative store
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g., duplicate entry)
    #[error("Conflict: {0}")]
    Conflict(String),

    // ============ Authentication Errors ============
    /// No credentials were presented
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Session id was presented but no live session answers to it
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    // ============ Infrastructure Errors ============
    /// The remote key-value store could not be reached or rejected the command
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A payload could not be encoded or decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Backing store error
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BazaarError {
    /// Returns the HTTP status code an outer gate should answer with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Unauthorized(_) | Self::InvalidSession(_) => 401,
            Self::StoreUnavailable(_) => 503,
            Self::Decode(_)
            | Self::Database(_)
            | Self::Configuration(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidSession(_) => "INVALID_SESSION",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a store transport error.
    #[must_use]
    pub fn store<T: Into<String>>(message: T) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Creates an invalid session error.
    #[must_use]
    pub fn invalid_session<T: Into<String>>(message: T) -> Self {
        Self::InvalidSession(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error is retriable.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::Database(_))
    }

    /// Checks if this error came from the key-value store transport.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<serde_json::Error> for BazaarError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(format!("JSON serialization error: {}", err))
    }
}
