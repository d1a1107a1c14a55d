//! Configuration loading and typed config structures for the simulator.
//!
//! The configuration lives in `sapsim.yaml` (or the file named by
//! `SAPSIM_CONFIG`). Every field has a default, so an empty document and a
//! missing file both yield a runnable configuration with no systems.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::definition::SystemDefinition;
use crate::monitor::{DEFAULT_BROADCAST_CAPACITY, DEFAULT_MAX_REQUESTS};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "SAPSIM_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "sapsim.yaml";

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

    /// An environment override held an unusable value.
    #[error("invalid value {value:?} for {name}")]
    InvalidOverride {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulatorConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Request monitor settings.
    #[serde(default)]
    pub monitor: MonitorSettings,

    /// Mock data provider settings.
    #[serde(default)]
    pub data: DataSettings,

    /// Systems registered at startup.
    #[serde(default)]
    pub systems: Vec<SystemDefinition>,
}

impl SimulatorConfig {
    /// Load configuration from a YAML file and apply environment
    /// overrides:
    /// - `SAPSIM_HOST` overrides `server.host`
    /// - `SAPSIM_PORT` overrides `server.port`
    /// - `SAPSIM_DATA_DIR` overrides `data.directory`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] for a malformed override.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Like [`SimulatorConfig::from_file`], but a missing file yields the
    /// defaults (with overrides applied).
    ///
    /// # Errors
    ///
    /// Same as [`SimulatorConfig::from_file`], except for `NotFound`.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::from_file(path) {
            Err(ConfigError::Io { source }) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse configuration from a YAML string. No overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] when `SAPSIM_PORT` is not a
    /// port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Override settings from `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] when the port is not a port
    /// number.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(host) = lookup("SAPSIM_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SAPSIM_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                name: "SAPSIM_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(directory) = lookup("SAPSIM_DATA_DIR") {
            self.data.directory = PathBuf::from(directory);
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Request monitor settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitorSettings {
    /// Maximum retained log entries.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// Entries an observer may fall behind before it skips ahead.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,

    /// Bytes of each request/response body kept in a log entry.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            broadcast_capacity: default_broadcast_capacity(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Which mock data provider to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBackend {
    /// Volatile in-memory collections.
    #[default]
    Memory,
    /// One JSON document per collection under `data.directory`.
    File,
}

/// Mock data provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataSettings {
    /// Provider implementation.
    #[serde(default)]
    pub backend: DataBackend,

    /// Directory for the file backend.
    #[serde(default = "default_data_directory")]
    pub directory: PathBuf,

    /// Populate the provider with sample records at startup.
    #[serde(default = "default_seed")]
    pub seed: bool,

    /// Records generated per seeded collection.
    #[serde(default = "default_seed_records")]
    pub seed_records: BTreeMap<String, usize>,

    /// RNG seed for reproducible sample data.
    #[serde(default = "default_rng_seed")]
    pub rng_seed: u64,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            backend: DataBackend::default(),
            directory: default_data_directory(),
            seed: default_seed(),
            seed_records: default_seed_records(),
            rng_seed: default_rng_seed(),
        }
    }
}

impl DataSettings {
    /// Records to generate for `collection`, falling back to `fallback`.
    pub fn records_for(&self, collection: &str, fallback: usize) -> usize {
        self.seed_records.get(collection).copied().unwrap_or(fallback)
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_max_requests() -> usize {
    DEFAULT_MAX_REQUESTS
}

const fn default_broadcast_capacity() -> usize {
    DEFAULT_BROADCAST_CAPACITY
}

const fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_data_directory() -> PathBuf {
    PathBuf::from("data")
}

const fn default_seed() -> bool {
    true
}

fn default_seed_records() -> BTreeMap<String, usize> {
    BTreeMap::new()
}

const fn default_rng_seed() -> u64 {
    42
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::handlers::HandlerBinding;

    #[test]
    fn default_config_is_valid() {
        let config = SimulatorConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.monitor.max_requests, 1000);
        assert_eq!(config.data.backend, DataBackend::Memory);
        assert!(config.data.seed);
        assert!(config.systems.is_empty());
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(SimulatorConfig::parse("").unwrap(), SimulatorConfig::default());
        assert_eq!(SimulatorConfig::parse("{}").unwrap(), SimulatorConfig::default());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
server:
  host: 127.0.0.1
  port: 9000
monitor:
  max_requests: 50
  broadcast_capacity: 8
  max_body_bytes: 1024
data:
  backend: file
  directory: /tmp/sapsim
  seed: false
  seed_records:
    BusinessPartners: 5
  rng_seed: 7
systems:
  - id: CRM
    name: Customer Relationship
    type: CRM
    modules:
      - id: ACT
        endpoints:
          - path: /Ping
            method: GET
            handler: { kind: static, body: { pong: true } }
";
        let config = SimulatorConfig::parse(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.monitor.max_requests, 50);
        assert_eq!(config.monitor.max_body_bytes, 1024);
        assert_eq!(config.data.backend, DataBackend::File);
        assert_eq!(config.data.directory, PathBuf::from("/tmp/sapsim"));
        assert_eq!(config.data.records_for("BusinessPartners", 20), 5);
        assert_eq!(config.data.records_for("Materials", 20), 20);
        assert_eq!(config.data.rng_seed, 7);

        let system = config.systems.first().unwrap();
        assert_eq!(system.system_type, "CRM");
        let endpoint = system.modules.first().unwrap().endpoints.first().unwrap();
        assert!(matches!(endpoint.handler, HandlerBinding::Static { .. }));
        assert!(system.build().is_ok());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = SimulatorConfig::parse("monitor:\n  max_requests: 10\n").unwrap();
        assert_eq!(config.monitor.max_requests, 10);
        assert_eq!(config.monitor.broadcast_capacity, 256);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn invalid_yaml_is_error() {
        assert!(matches!(
            SimulatorConfig::parse("server: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn overrides_replace_values() {
        let mut config = SimulatorConfig::default();
        config
            .apply_overrides(|name| match name {
                "SAPSIM_HOST" => Some(String::from("127.0.0.1")),
                "SAPSIM_PORT" => Some(String::from("9100")),
                "SAPSIM_DATA_DIR" => Some(String::from("/var/sapsim")),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.data.directory, PathBuf::from("/var/sapsim"));
    }

    #[test]
    fn bad_port_override_is_error() {
        let mut config = SimulatorConfig::default();
        let result = config.apply_overrides(|name| {
            (name == "SAPSIM_PORT").then(|| String::from("eighty"))
        });
        assert!(matches!(result, Err(ConfigError::InvalidOverride { name: "SAPSIM_PORT", .. })));
    }

    #[test]
    fn from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sapsim.yaml");
        std::fs::write(&path, "server:\n  port: 8181\n").unwrap();
        let config = SimulatorConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 8181);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(matches!(
            SimulatorConfig::from_file(&path),
            Err(ConfigError::Io { .. })
        ));
        assert!(SimulatorConfig::load_or_default(&path).is_ok());
    }
}
