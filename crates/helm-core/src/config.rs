//! Configuration loading and typed config structures for the session core.
//!
//! Configuration is a small YAML document. Every field has a default, so an
//! empty document (or no file at all) yields a working realtime session
//! against `localhost:3000`.
//!
//! ```yaml
//! server:
//!   host: demo.signalk.org
//!   port: 443
//!   ssl: true
//!   connect_timeout_ms: 15000
//! stream:
//!   subscribe_period_ms: 1000
//! trail:
//!   enabled: true
//! ais:
//!   stale_after_secs: 600
//! selections:
//!   heading_attribute: magnetic
//! logging:
//!   level: debug
//!   json: false
//! ```

use std::path::Path;
use std::time::Duration;

use helm_types::HeadingAttribute;
use serde::{Deserialize, Serialize};

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

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Telemetry server location.
    #[serde(default)]
    pub server: ServerConfig,

    /// Stream endpoint and subscription settings.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Trail recording.
    #[serde(default)]
    pub trail: TrailConfig,

    /// AIS target housekeeping.
    #[serde(default)]
    pub ais: AisConfig,

    /// Display selections.
    #[serde(default)]
    pub selections: SelectionsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SessionConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the server location:
    /// - `SIGNALK_HOST` overrides `server.host`
    /// - `SIGNALK_PORT` overrides `server.port`
    /// - `SIGNALK_SSL` overrides `server.ssl`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides
    /// and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config
            .server
            .apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the session cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero port or a zero
    /// subscription period.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                reason: "server.port must be non-zero".to_owned(),
            });
        }
        if self.stream.subscribe_period_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "stream.subscribe_period_ms must be non-zero".to_owned(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Telemetry server location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use TLS (`https`/`wss`).
    #[serde(default)]
    pub ssl: bool,

    /// Abort a connection attempt that has not opened after this many
    /// milliseconds. `0` disables the guard.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl ServerConfig {
    /// Override fields from a variable lookup (normally the process
    /// environment). Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("SIGNALK_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SIGNALK_PORT").and_then(|v| v.parse().ok()) {
            self.port = port;
        }
        if let Some(ssl) = lookup("SIGNALK_SSL") {
            match ssl.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.ssl = true,
                "0" | "false" | "no" => self.ssl = false,
                _ => {}
            }
        }
    }

    /// The connect timeout, or `None` when disabled.
    pub const fn connect_timeout(&self) -> Option<Duration> {
        if self.connect_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.connect_timeout_ms))
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ssl: false,
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Stream endpoint and subscription settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Path of the realtime stream endpoint.
    #[serde(default = "default_realtime_path")]
    pub realtime_path: String,

    /// Path of the playback stream endpoint.
    #[serde(default = "default_playback_path")]
    pub playback_path: String,

    /// Context subscribed to on every realtime connection.
    #[serde(default = "default_subscribe_context")]
    pub subscribe_context: String,

    /// Requested update period of the subscription.
    #[serde(default = "default_subscribe_period_ms")]
    pub subscribe_period_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            realtime_path: default_realtime_path(),
            playback_path: default_playback_path(),
            subscribe_context: default_subscribe_context(),
            subscribe_period_ms: default_subscribe_period_ms(),
        }
    }
}

/// Trail recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailConfig {
    /// Sample the active vessel into the trail every tick.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// AIS target housekeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AisConfig {
    /// Remove targets not updated for this many seconds.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl AisConfig {
    /// Maximum target age as a chrono duration.
    pub fn max_age(&self) -> chrono::Duration {
        i64::try_from(self.stale_after_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for AisConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

/// Display selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionsConfig {
    /// Show true or magnetic heading, course and wind direction.
    #[serde(default)]
    pub heading_attribute: HeadingAttribute,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "localhost".to_owned()
}

const fn default_port() -> u16 {
    3000
}

const fn default_connect_timeout_ms() -> u64 {
    15_000
}

fn default_realtime_path() -> String {
    "/signalk/v1/stream".to_owned()
}

fn default_playback_path() -> String {
    "/signalk/v1/playback".to_owned()
}

fn default_subscribe_context() -> String {
    "*".to_owned()
}

const fn default_subscribe_period_ms() -> u64 {
    1000
}

const fn default_true() -> bool {
    true
}

const fn default_stale_after_secs() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_owned()
}
