//! Config file preprocessing and value parsing.

use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};
use thiserror::Error;

/// `${NAME}` or `${NAME:-fallback}`.
static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .expect("env reference pattern is valid")
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML in config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Parse a human-readable duration such as `30s` or `5m` for `field`.
///
/// ```
/// use patient_records::config::parse_duration;
///
/// let wait = parse_duration("database.acquire_timeout", "5m").unwrap();
/// assert_eq!(wait.as_secs(), 300);
/// ```
pub fn parse_duration(field: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim() {
        "" => Err(ConfigError::invalid(field, "empty duration")),
        value => humantime::parse_duration(value)
            .map_err(|e| ConfigError::invalid(field, format!("'{}': {}", value, e))),
    }
}

/// Substitute environment references in raw config text.
///
/// Unset variables take their fallback, or the empty string without one.
pub fn expand_env_vars(input: &str) -> String {
    ENV_REFERENCE
        .replace_all(input, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| {
                caps.get(2)
                    .map_or_else(String::new, |fallback| fallback.as_str().to_string())
            })
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_timeout_forms() {
        let field = "database.acquire_timeout";
        assert_eq!(parse_duration(field, " 5m ").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration(field, "1m30s").unwrap(), Duration::from_secs(90));

        let err = parse_duration(field, "whenever").unwrap_err();
        assert!(err.to_string().starts_with("invalid database.acquire_timeout"));
        assert!(parse_duration(field, "").is_err());
    }

    #[test]
    fn test_mysql_password_reference_uses_fallback() {
        let yaml = "password: ${PATIENTS_UNSET_MYSQL_PASSWORD:-changeme}\nuser: ${PATIENTS_UNSET_MYSQL_USER}";
        assert_eq!(expand_env_vars(yaml), "password: changeme\nuser: ");
    }
}
