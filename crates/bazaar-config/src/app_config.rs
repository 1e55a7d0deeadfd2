//! Application configuration structures.

use bazaar_core::TelemetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Remote key-value store connection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Entity cache behaviour.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Session and ephemeral token lifetimes.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "bazaar".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Key-value store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store host.
    pub host: String,
    /// Store port.
    pub port: u16,
    /// Connection pool size.
    pub pool_size: usize,
    /// Enable the store (can be disabled for local development).
    pub enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            pool_size: 10,
            enabled: true,
        }
    }
}

impl StoreConfig {
    /// Returns the connection URL for the store.
    #[must_use]
    pub fn url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

/// Entity cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for cached entity snapshots, in seconds.
    pub default_ttl_secs: u64,
    /// Delete attempts per key when invalidating after a write.
    pub invalidation_attempts: u32,
    /// Delay before the first invalidation retry, in milliseconds. Doubles per attempt.
    pub invalidation_backoff_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 3600, // 1 hour
            invalidation_attempts: 3,
            invalidation_backoff_ms: 50,
        }
    }
}

impl CacheConfig {
    /// Returns the entity TTL as a Duration.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Returns the first invalidation retry delay as a Duration.
    #[must_use]
    pub const fn invalidation_backoff(&self) -> Duration {
        Duration::from_millis(self.invalidation_backoff_ms)
    }
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sliding session TTL in seconds. Every touch restarts the window.
    pub ttl_secs: u64,
    /// Fixed lifetime of password reset tokens in seconds.
    pub password_reset_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,               // 1 hour
            password_reset_ttl_secs: 600, // 10 minutes
        }
    }
}

impl SessionConfig {
    /// Returns the session TTL as a Duration.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Returns the password reset token TTL as a Duration.
    #[must_use]
    pub const fn password_reset_ttl(&self) -> Duration {
        Duration::from_secs(self.password_reset_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store.port, 6379);
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(3600));
        assert_eq!(config.session.ttl(), Duration::from_secs(3600));
        assert_eq!(config.session.password_reset_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn test_store_url() {
        let store = StoreConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            ..Default::default()
        };
        assert_eq!(store.url(), "redis://cache.internal:6380");
    }
}
