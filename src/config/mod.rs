//! Configuration module for the patient records application.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (port, bind address, static directory)
//! - Database settings (local MySQL connection, pool sizing, memory fallback)

mod app;
mod validation;

pub use app::{AppConfig, DEFAULT_PORT, DatabaseConfig, ServerConfig};
pub use validation::{ConfigError, expand_env_vars, parse_duration};
