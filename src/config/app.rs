//! Application configuration structures.

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::storage::db::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
use crate::storage::{MySqlSettings, PoolSettings};

use super::validation::{ConfigError, expand_env_vars, parse_duration};

// =============================================================================
// Constants
// =============================================================================

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout() -> String {
    humantime::format_duration(DEFAULT_ACQUIRE_TIMEOUT).to_string()
}

fn default_memory_fallback() -> bool {
    true
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address (default: "0.0.0.0").
    pub bind: String,

    /// Server port (default: 3000).
    pub port: u16,

    /// Directory whose files are served at the site root (default: "public").
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            static_dir: "public".to_string(),
        }
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local MySQL connection used when no cloud URL is set.
    #[serde(default)]
    pub local: MySqlSettings,

    /// Maximum pooled connections (default: 10).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Wait for a free pooled connection (default: "5m").
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: String,

    /// Fall back to in-memory storage on a hosting platform without a
    /// database URL (default: true).
    #[serde(default = "default_memory_fallback")]
    pub memory_fallback: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            local: MySqlSettings::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: default_acquire_timeout(),
            memory_fallback: true,
        }
    }
}

impl DatabaseConfig {
    /// Pool sizing for the relational backends.
    pub fn pool_settings(&self) -> Result<PoolSettings, ConfigError> {
        let acquire_timeout = parse_duration("database.acquire_timeout", &self.acquire_timeout)?;

        Ok(PoolSettings {
            max_connections: self.max_connections,
            acquire_timeout,
        })
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// `${VAR}` and `${VAR:-default}` references are expanded before parsing.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&expand_env_vars(&content))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::invalid(
                "server.bind",
                format!("'{}' is not an IP address", self.server.bind),
            )
        })?;

        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "must be non-zero"));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be positive",
            ));
        }

        if self.database.local.host.trim().is_empty() {
            return Err(ConfigError::invalid("database.local.host", "cannot be empty"));
        }

        self.database.pool_settings()?;

        Ok(())
    }
}
