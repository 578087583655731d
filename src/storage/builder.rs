//! Storage builder.
//!
//! Turns a [`BackendSelection`] into a [`PatientStore`] bound to the
//! matching backend.

use std::sync::Arc;
use std::time::Duration;

use crate::storage::StorageError;
use crate::storage::backend::PatientBackend;
use crate::storage::db::{MySqlBackend, PoolSettings, PostgresBackend};
use crate::storage::facades::PatientStore;
use crate::storage::memory::MemoryBackend;
use crate::storage::selector::BackendSelection;

/// Builder for constructing the storage layer.
pub struct StorageBuilder {
    selection: BackendSelection,
    pool: PoolSettings,
}

impl StorageBuilder {
    /// Create a new storage builder for the selected backend.
    pub fn new(selection: BackendSelection) -> Self {
        Self {
            selection,
            pool: PoolSettings::default(),
        }
    }

    /// Builder for the volatile in-memory backend.
    pub fn memory() -> Self {
        Self::new(BackendSelection::Memory)
    }

    /// Set the maximum number of pooled connections (relational backends).
    pub fn max_connections(mut self, max: u32) -> Self {
        self.pool.max_connections = max;
        self
    }

    /// Set how long a caller waits for a free pooled connection.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.pool.acquire_timeout = timeout;
        self
    }

    /// Build the storage handle.
    ///
    /// Relational pools connect lazily; only a malformed connection URL fails
    /// here.
    pub fn build(self) -> Result<PatientStore, StorageError> {
        let backend: Arc<dyn PatientBackend> = match self.selection {
            BackendSelection::Cloud { url } => {
                Arc::new(PostgresBackend::connect_lazy(&url, self.pool)?)
            }
            BackendSelection::Local(settings) => {
                Arc::new(MySqlBackend::connect_lazy(&settings, self.pool))
            }
            BackendSelection::Memory => Arc::new(MemoryBackend::new()),
        };

        Ok(PatientStore::new(backend))
    }
}
