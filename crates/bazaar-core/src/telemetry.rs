//! Tracing subscriber setup.

use crate::BazaarResult;
use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Include the event target in each line.
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

fn default_log_level() -> String {
    "info,bazaar=debug".to_string()
}

fn default_with_target() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            with_target: default_with_target(),
        }
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Returns a configuration error
/// if a global subscriber is already set.
#[cfg(feature = "telemetry")]
pub fn init_telemetry(config: &TelemetryConfig) -> BazaarResult<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| crate::BazaarError::Configuration(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(config.with_target))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
            .try_init()
    };

    result.map_err(|e| {
        crate::BazaarError::Configuration(format!("Failed to install tracing subscriber: {}", e))
    })?;

    tracing::info!(log_level = %config.log_level, json = config.json, "Telemetry initialized");
    Ok(())
}

/// Placeholder for when the telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn init_telemetry(_config: &TelemetryConfig) -> BazaarResult<()> {
    Ok(())
}
