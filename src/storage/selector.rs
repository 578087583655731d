//! Backend selection from environment signals.
//!
//! Exactly one backend is chosen at startup, in priority order:
//!
//! 1. A cloud connection string is present: PostgreSQL over TLS.
//! 2. Running on a hosting platform without one: the volatile memory store
//!    (when the fallback is enabled).
//! 3. Otherwise: local MySQL.

use crate::storage::db::MySqlSettings;
use crate::storage::types::BackendKind;

/// Runtime environment value that counts as a hosted deployment.
const PRODUCTION_ENV: &str = "production";

/// Configuration signals inspected by [`BackendSelection::select`].
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSignals {
    /// Cloud relational connection string (`DATABASE_URL`).
    pub database_url: Option<String>,
    /// Hosting platform flag (`RENDER`).
    pub hosting_platform: bool,
    /// Runtime environment (`NODE_ENV`).
    pub runtime_env: Option<String>,
}

impl EnvironmentSignals {
    fn cloud_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    fn is_hosted(&self) -> bool {
        self.hosting_platform
            || self
                .runtime_env
                .as_deref()
                .is_some_and(|env| env.eq_ignore_ascii_case(PRODUCTION_ENV))
    }
}

/// The backend bound for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelection {
    /// Cloud-hosted PostgreSQL.
    Cloud { url: String },
    /// Volatile in-process store.
    Memory,
    /// Local MySQL.
    Local(MySqlSettings),
}

impl BackendSelection {
    /// Choose a backend. Never fails; connection problems surface later.
    pub fn select(
        signals: &EnvironmentSignals,
        local: &MySqlSettings,
        memory_fallback: bool,
    ) -> Self {
        let selection = if let Some(url) = signals.cloud_url() {
            Self::Cloud {
                url: url.to_string(),
            }
        } else if memory_fallback && signals.is_hosted() {
            Self::Memory
        } else {
            Self::Local(local.clone())
        };

        match &selection {
            Self::Cloud { .. } => {
                tracing::info!(backend = %selection.kind(), "Using cloud PostgreSQL database")
            }
            Self::Memory => tracing::warn!(
                backend = %selection.kind(),
                "No database configured on hosting platform, using in-memory storage (data is not persisted)"
            ),
            Self::Local(settings) => tracing::info!(
                backend = %selection.kind(),
                host = %settings.host,
                database = %settings.database,
                "Using local MySQL database"
            ),
        }

        selection
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Cloud { .. } => BackendKind::Postgres,
            Self::Memory => BackendKind::Memory,
            Self::Local(_) => BackendKind::Mysql,
        }
    }
}
