//! Layered settings: defaults, optional TOML file, then `THERMASAFE__*` env vars

use alert_store::DEFAULT_HISTORY_CAPACITY;
use config::{Config, Environment, File};
use heat_monitor::MonitorConfig;
use serde::Deserialize;

/// Default settings file, overridden by `THERMASAFE_CONFIG`
pub const DEFAULT_CONFIG_PATH: &str = "thermasafe.toml";

/// Top-level settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub monitor: MonitorConfig,
    pub server: ServerSettings,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingSettings,
    pub alerts: AlertSettings,
}

/// HTTP listener
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Per-IP rate limiting of the ingestion route
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Max requests that can be made immediately
    pub burst_size: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            per_second: 1,
            burst_size: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive, used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Alerts kept in memory for the dashboard
    pub history_capacity: usize,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Settings {
    /// Load from `$THERMASAFE_CONFIG` (or `thermasafe.toml`) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("THERMASAFE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load from a specific file; a missing file is not an error
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("THERMASAFE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
