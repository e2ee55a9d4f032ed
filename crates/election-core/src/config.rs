//! Configuration loading and typed config structures for Election Live.
//!
//! The canonical configuration lives in `election-config.yaml` next to the
//! binary. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Smallest accepted generation period.
pub const MIN_GENERATION_INTERVAL_MS: u64 = 100;

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

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `election-config.yaml`. Every field has a
/// default, so an empty document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LiveConfig {
    /// Listener and CORS settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Generation loop settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Candidate store gateway settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LiveConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// A missing file yields the defaults; reporting that is left to the
    /// caller, which may not have logging set up yet. Environment variables then
    /// override individual values:
    /// - `PORT` overrides `server.port`
    /// - `CLIENT_URL` overrides `server.client_origin`
    /// - `CANDIDATES_FILE` overrides `store.path`
    /// - `GENERATION_INTERVAL_MS` overrides `generation.interval_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => serde_yml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// Environment overrides are not applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process
    /// environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric override does not
    /// parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("PORT") {
            self.server.port = val.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "server.port",
                reason: format!("PORT={val}: {e}"),
            })?;
        }
        if let Some(val) = lookup("CLIENT_URL") {
            self.server.client_origin = val;
        }
        if let Some(val) = lookup("CANDIDATES_FILE") {
            self.store.path = PathBuf::from(val);
        }
        if let Some(val) = lookup("GENERATION_INTERVAL_MS") {
            self.generation.interval_ms =
                val.trim().parse().map_err(|e| ConfigError::Invalid {
                    field: "generation.interval_ms",
                    reason: format!("GENERATION_INTERVAL_MS={val}: {e}"),
                })?;
        }
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero port, an interval below
    /// [`MIN_GENERATION_INTERVAL_MS`], or a zero outbound queue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                field: "server.port",
                reason: String::from("must be non-zero"),
            });
        }
        if self.generation.interval_ms < MIN_GENERATION_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                field: "generation.interval_ms",
                reason: format!(
                    "{} is below the {MIN_GENERATION_INTERVAL_MS}ms minimum",
                    self.generation.interval_ms
                ),
            });
        }
        if self.generation.outbound_queue == 0 {
            return Err(ConfigError::Invalid {
                field: "generation.outbound_queue",
                reason: String::from("must be at least 1"),
            });
        }
        Ok(())
    }
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origin for the dashboard. `*` allows any origin.
    #[serde(default = "default_client_origin")]
    pub client_origin: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_origin: default_client_origin(),
        }
    }
}

/// Generation loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationConfig {
    /// Milliseconds between ticks of one connection's loop.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Per-connection outbound queue capacity. Frames beyond this are
    /// dropped for that peer only.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl GenerationConfig {
    /// The tick period as a [`Duration`].
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

/// Which store gateway backs candidate creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Process-local memory; contents vanish on restart.
    Memory,
    /// A pretty-printed JSON array on disk.
    #[default]
    JsonFile,
}

/// Candidate store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Store gateway kind.
    #[serde(default)]
    pub kind: StoreKind,

    /// File path for [`StoreKind::JsonFile`].
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Write the starter candidates when the file does not exist yet.
    #[serde(default = "default_true")]
    pub seed: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_store_path(),
            seed: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8000
}

fn default_client_origin() -> String {
    "http://localhost:3000".to_owned()
}

const fn default_interval_ms() -> u64 {
    5_000
}

const fn default_outbound_queue() -> usize {
    256
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/candidates.json")
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
