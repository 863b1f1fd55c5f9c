//! Configuration management for the tree server
//!
//! Loaded once at startup from `config.toml` with `FILETREE_` environment
//! overrides, then handed explicitly to the server and structure store.

use chrono::format::{Item, StrftimeItems};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ServerConfig {
    pub server: StartupConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub projects: ProjectsConfig,
}

/// Network and session settings (restart required)
#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    /// IP address to bind the listener
    /// Environment: FILETREE_SERVER__BIND_ADDRESS
    pub bind_address: String,

    /// Listener port; 0 picks an ephemeral port
    /// Environment: FILETREE_SERVER__PORT
    pub port: u16,

    /// Maximum concurrent clients
    pub max_clients: usize,

    /// Maximum request line length in bytes
    pub max_command_length: usize,

    /// Default log filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which document store backend to use
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
}

/// Persistence settings
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Directory holding documents for the file backend
    pub root: String,

    /// strftime format used for `created` timestamps
    pub time_format: String,

    /// Attempts per mutation before giving up on version conflicts
    pub max_retries: usize,

    /// Deadline for each store round-trip
    pub timeout_secs: u64,

    /// Flush writes to stable storage before acknowledging them
    #[serde(default)]
    pub sync_writes: bool,
}

/// Project identity lookup table
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProjectsConfig {
    /// Treat identifiers missing from `registered` as project ids
    #[serde(default)]
    pub accept_unlisted_ids: bool,

    /// Human-readable project name -> project id
    #[serde(default)]
    pub registered: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 4141,
            max_clients: 64,
            max_command_length: 8192,
            log_level: default_log_level(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            root: "./tree_store".to_string(),
            time_format: "%Y-%m-%dT%H:%M:%S%.3fZ".to_string(),
            max_retries: 3,
            timeout_secs: 5,
            sync_writes: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_paths = [
            "filetree-server/config", // container layout: /app/filetree-server/config.toml
            "config",                 // local development: ./config.toml
        ];

        let mut last_error = None;

        for config_path in config_paths {
            match Self::builder(File::with_name(config_path)).build() {
                Ok(settings) => {
                    let config: ServerConfig = settings.try_deserialize()?;
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            config::ConfigError::Message(format!(
                "no configuration found, tried {config_paths:?}"
            ))
        }))
    }

    /// Parse configuration from TOML text, still honouring environment overrides
    pub fn from_toml(text: &str) -> Result<Self, config::ConfigError> {
        let config: ServerConfig = Self::builder(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn builder<S>(source: S) -> config::ConfigBuilder<config::builder::DefaultState>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder().add_source(source).add_source(
            Environment::with_prefix("FILETREE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.bind_address.is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.server.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.server.max_command_length < 64 {
            return Err(config::ConfigError::Message(
                "max_command_length must be at least 64 bytes".into(),
            ));
        }

        if self.store.backend == StoreBackend::File && self.store.root.is_empty() {
            return Err(config::ConfigError::Message(
                "store root cannot be empty for the file backend".into(),
            ));
        }

        if self.store.max_retries == 0 {
            return Err(config::ConfigError::Message(
                "max_retries must be greater than 0".into(),
            ));
        }

        if self.store.timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "store timeout_secs must be greater than 0".into(),
            ));
        }

        let time_format_ok = !self.store.time_format.is_empty()
            && StrftimeItems::new(&self.store.time_format).all(|item| !matches!(item, Item::Error));
        if !time_format_ok {
            return Err(config::ConfigError::Message(format!(
                "invalid time_format: {:?}",
                self.store.time_format
            )));
        }

        Ok(())
    }
}

impl StartupConfig {
    /// Get bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl StoreConfig {
    /// Get store root as PathBuf
    pub fn root_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    /// Get round-trip deadline as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
