//! Configuration loading and typed config structures for sensorstream.
//!
//! The configuration lives in `sensorstream.yaml`. This module defines
//! strongly-typed structs that mirror the YAML structure; every field has
//! a default so a partial (or missing) file is always usable.

use std::path::Path;

use serde::Deserialize;

/// Environment variable overriding [`HttpConfig::host`].
pub const ENV_HOST: &str = "SENSORSTREAM_HOST";

/// Environment variable overriding [`HttpConfig::port`].
pub const ENV_PORT: &str = "SENSORSTREAM_PORT";

/// Environment variable overriding [`StreamConfig::tick_interval_ms`].
pub const ENV_TICK_INTERVAL_MS: &str = "SENSORSTREAM_TICK_INTERVAL_MS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but cannot be used.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending key.
        field: &'static str,
        /// Explanation of what is wrong with the value.
        reason: &'static str,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `sensorstream.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SensorConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: HttpConfig,

    /// Value ranges and seed for the reading generator.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Tick cadence, history size and broadcast mode.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SensorConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SENSORSTREAM_HOST` overrides `server.host`
    /// - `SENSORSTREAM_PORT` overrides `server.port`
    /// - `SENSORSTREAM_TICK_INTERVAL_MS` overrides `stream.tick_interval_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails [`validate`](Self::validate).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails [`validate`](Self::validate).
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that the HTTP layer consumes directly.
    ///
    /// Generator ranges, history capacity and tick interval are checked
    /// when the hub is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `stream.keep_alive_secs` is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.keep_alive_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "stream.keep_alive_secs",
                reason: "keep-alive interval must be at least 1 second",
            });
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Numeric values that fail to parse are ignored and the existing
    /// value is kept.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(ENV_HOST) {
            self.server.host = val;
        }
        if let Some(port) = lookup(ENV_PORT).and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(ms) = lookup(ENV_TICK_INTERVAL_MS).and_then(|v| v.parse().ok()) {
            self.stream.tick_interval_ms = ms;
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// The host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Reading generator configuration.
///
/// Ranges are closed; each minimum must be strictly below its maximum.
/// Validation happens when the generator is built, not here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratorConfig {
    /// Lowest temperature that can be generated.
    #[serde(default = "default_min_temp")]
    pub min_temp: f64,

    /// Highest temperature that can be generated.
    #[serde(default = "default_max_temp")]
    pub max_temp: f64,

    /// Lowest humidity that can be generated.
    #[serde(default = "default_min_humidity")]
    pub min_humidity: f64,

    /// Highest humidity that can be generated.
    #[serde(default = "default_max_humidity")]
    pub max_humidity: f64,

    /// Fixed random seed. `None` seeds from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_temp: default_min_temp(),
            max_temp: default_max_temp(),
            min_humidity: default_min_humidity(),
            max_humidity: default_max_humidity(),
            seed: None,
        }
    }
}

/// How ticks are shared between concurrent subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastMode {
    /// Every subscription runs its own generate/append/emit loop.
    #[default]
    PerSession,
    /// One ticker generates per tick and fans the reading out to all
    /// subscribers.
    Shared,
}

/// Streaming configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Number of readings kept in the shared history.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Tick sharing mode.
    #[serde(default)]
    pub mode: BroadcastMode,

    /// Seconds between SSE keep-alive comments.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

impl StreamConfig {
    /// Interval between SSE keep-alive comments.
    pub const fn keep_alive(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.keep_alive_secs)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            history_capacity: default_history_capacity(),
            mode: BroadcastMode::default(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8000
}

const fn default_min_temp() -> f64 {
    18.0
}

const fn default_max_temp() -> f64 {
    26.0
}

const fn default_min_humidity() -> f64 {
    30.0
}

const fn default_max_humidity() -> f64 {
    65.0
}

const fn default_tick_interval_ms() -> u64 {
    30_000
}

const fn default_history_capacity() -> usize {
    20
}

const fn default_keep_alive_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_owned()
}
