//! Client configuration loading from file and environment variables.

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Top-level telemetry configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    /// Initial client scope. Unset by default.
    #[serde(default)]
    pub scope: Option<String>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TelemetryConfig {
    /// Configuration with the given initial scope and default logging.
    pub fn with_scope(scope: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            ..Self::default()
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "beacon_telemetry=trace,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A global tracing subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::FileRead(_) => "config_file_read",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::Logging(_) => "config_logging",
        }
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `BEACON_SCOPE` overrides `scope`
/// - `BEACON_LOG_LEVEL` overrides `logging.level`
/// - `BEACON_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<TelemetryConfig, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                TelemetryConfig::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => TelemetryConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_overrides(config: &mut TelemetryConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(scope) = lookup("BEACON_SCOPE") {
        config.scope = Some(scope);
    }
    if let Some(level) = lookup("BEACON_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("BEACON_LOG_JSON") {
        config.logging.json = json.eq_ignore_ascii_case("true") || json == "1";
    }
}

/// Installs a global `tracing` subscriber for the given settings.
///
/// An unparsable level falls back to `info`.
///
/// # Errors
///
/// Returns `ConfigError::Logging` if a global subscriber is already set.
pub fn init_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))
}
