//! Configuration loader with layered sources.

use crate::AppConfig;
use bazaar_core::BazaarError;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Untracked local overrides
    /// 4. Environment variables with `BAZAAR__` prefix (`BAZAAR__STORE__HOST`)
    pub fn new(config_dir: impl Into<String>) -> Result<Self, BazaarError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, BazaarError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> Result<(), BazaarError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, BazaarError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("BAZAAR_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("BAZAAR")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_bazaar_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_bazaar_error)?;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Validates the configuration.
    fn validate_config(config: &AppConfig) -> Result<(), BazaarError> {
        if config.store.enabled {
            if config.store.host.trim().is_empty() {
                return Err(BazaarError::Configuration("Store host is required".to_string()));
            }
            if config.store.port == 0 {
                return Err(BazaarError::Configuration("Store port must be non-zero".to_string()));
            }
        } else {
            warn!("Key-value store is disabled: every cache read will miss and sessions will not persist");
        }

        if config.session.ttl_secs == 0 {
            return Err(BazaarError::Configuration(
                "Session TTL must be non-zero".to_string(),
            ));
        }

        if config.session.password_reset_ttl_secs == 0 {
            return Err(BazaarError::Configuration(
                "Password reset TTL must be non-zero".to_string(),
            ));
        }

        if config.cache.invalidation_attempts == 0 {
            return Err(BazaarError::Configuration(
                "At least one invalidation attempt is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Gets a specific configuration value by key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_bazaar_error(err: ConfigError) -> BazaarError {
    BazaarError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_loads_defaults_from_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.store.host, "localhost");
        assert_eq!(config.session.ttl_secs, 3600);
    }

    #[tokio::test]
    async fn test_default_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            "[store]\nhost = \"memcache.local\"\nport = 11211\n\n[session]\nttl_secs = 900\n",
        )
        .unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.store.url(), "redis://memcache.local:11211");
        assert_eq!(config.session.ttl_secs, 900);
        assert_eq!(config.session.password_reset_ttl_secs, 600);

        let ttl: Option<u64> = loader.get_value("session.ttl_secs").await;
        assert_eq!(ttl, Some(900));
    }

    #[tokio::test]
    async fn test_rejects_zero_session_ttl() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.toml"), "[session]\nttl_secs = 0\n").unwrap();

        let result = ConfigLoader::new(dir.path().to_string_lossy());
        assert!(matches!(result, Err(BazaarError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("default.toml");
        fs::write(&path, "[cache]\ndefault_ttl_secs = 60\n").unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        assert_eq!(loader.get().await.cache.default_ttl_secs, 60);

        fs::write(&path, "[cache]\ndefault_ttl_secs = 120\n").unwrap();
        loader.reload().await.unwrap();
        assert_eq!(loader.get().await.cache.default_ttl_secs, 120);
    }

    #[tokio::test]
    async fn test_shipped_defaults_load() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config");
        let loader = ConfigLoader::new(dir).unwrap();
        let config = loader.get().await;
        assert_eq!(config.app.name, "bazaar");
        assert_eq!(config.cache.invalidation_attempts, 3);
    }
}
