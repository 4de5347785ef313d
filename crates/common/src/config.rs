//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Analytics engine configuration.
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Tuning knobs for the in-memory analytics engine.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Number of vote events retained by the activity log.
    #[serde(default = "default_activity_capacity")]
    pub activity_capacity: usize,
    /// Default look-ahead window for expiry sweeps, in minutes.
    #[serde(default = "default_expiry_window_minutes")]
    pub expiry_window_minutes: i64,
    /// Seconds between background expiry sweeps. Zero disables the task.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Default number of trending polls returned.
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
    /// Default number of activity events returned.
    #[serde(default = "default_activity_limit")]
    pub activity_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            activity_capacity: default_activity_capacity(),
            expiry_window_minutes: default_expiry_window_minutes(),
            sweep_interval_secs: default_sweep_interval_secs(),
            trending_limit: default_trending_limit(),
            activity_limit: default_activity_limit(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_activity_capacity() -> usize {
    50
}

const fn default_expiry_window_minutes() -> i64 {
    1440
}

const fn default_sweep_interval_secs() -> u64 {
    300
}

const fn default_trending_limit() -> usize {
    5
}

const fn default_activity_limit() -> usize {
    10
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `BALLOT_ENV`)
    /// 3. Environment variables with `BALLOT_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("BALLOT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BALLOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("BALLOT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
