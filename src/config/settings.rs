//! Configuration settings for the Almanac server.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub worker: WorkerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            // Current directory
            PathBuf::from("almanac.toml"),
            PathBuf::from("config.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("almanac/config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".almanac/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.worker.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("worker.poll_interval_secs must be > 0".to_string()).into());
        }

        if self.auth.token_expiry_days == 0 {
            return Err(ConfigError::Invalid("auth.token_expiry_days must be > 0".to_string()).into());
        }

        if self.auth.min_password_length == 0 {
            return Err(
                ConfigError::Invalid("auth.min_password_length must be > 0".to_string()).into(),
            );
        }

        if self.storage.persist && self.storage.data_dir.is_empty() {
            return Err(ConfigError::MissingField("storage.data_dir".to_string()).into());
        }

        Ok(())
    }

    /// The data directory as a path.
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// HTTP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT signing secret. Falls back to ALMANAC_JWT_SECRET when empty.
    pub jwt_secret: String,
    /// Token lifetime in days.
    pub token_expiry_days: i64,
    /// Minimum accepted password length at registration.
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_days: 7,
            min_password_length: 6,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Persist store contents to disk as JSON.
    pub persist: bool,
    /// Directory for persisted data.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persist: false,
            data_dir: "./data".to_string(),
        }
    }
}

/// Reminder dispatch worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Whether the dispatch worker runs at all.
    pub enabled: bool,
    /// Polling cadence in seconds.
    pub poll_interval_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: 60,
        }
    }
}
