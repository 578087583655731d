//! User-facing storage facade.
//!
//! [`PatientStore`] is the query execution gateway: route handlers hand it an
//! [`Intent`] and get rows back, whichever backend was selected at startup.

use std::sync::Arc;

use crate::storage::StorageError;
use crate::storage::backend::PatientBackend;
use crate::storage::intent::Intent;
use crate::storage::types::{BackendKind, NewPatient, PatientId, PatientRow, SearchFilter};

/// Cloneable handle to the bound backend.
#[derive(Clone)]
pub struct PatientStore {
    backend: Arc<dyn PatientBackend>,
}

impl std::fmt::Debug for PatientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatientStore")
            .field("backend", &self.backend.kind())
            .finish()
    }
}

impl PatientStore {
    /// Wrap an already constructed backend.
    pub fn new(backend: Arc<dyn PatientBackend>) -> Self {
        Self { backend }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Execute an intent against the bound backend.
    ///
    /// Insert yields the stored row, delete yields no rows, list and search
    /// yield rows ascending by last name. Failures are logged with backend
    /// context and returned unchanged.
    pub async fn execute(&self, intent: Intent) -> Result<Vec<PatientRow>, StorageError> {
        let name = intent.name().to_string();

        let result = match intent {
            Intent::ListAll => self.backend.list_all().await,
            Intent::InsertOne(patient) => self.backend.insert(patient).await.map(|row| vec![row]),
            Intent::DeleteById(id) => self.backend.delete(id).await.map(|deleted| {
                if !deleted {
                    tracing::debug!(id, "Delete matched no patient");
                }
                Vec::new()
            }),
            Intent::FilteredSearch(filter) => self.backend.search(&filter).await,
        };

        match &result {
            Ok(rows) => tracing::debug!(
                backend = %self.kind(),
                intent = %name,
                rows = rows.len(),
                "Query executed"
            ),
            Err(e) => tracing::error!(
                backend = %self.kind(),
                intent = %name,
                error = %e,
                "Database query error"
            ),
        }

        result
    }

    /// All patients, ascending by last name.
    pub async fn list_all(&self) -> Result<Vec<PatientRow>, StorageError> {
        self.execute(Intent::ListAll).await
    }

    /// Insert a patient and return the stored row.
    pub async fn insert(&self, patient: NewPatient) -> Result<PatientRow, StorageError> {
        self.execute(Intent::InsertOne(patient))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::Internal("insert returned no row".to_string()))
    }

    /// Delete a patient. Missing ids are a no-op.
    pub async fn delete(&self, id: PatientId) -> Result<(), StorageError> {
        self.execute(Intent::DeleteById(id)).await.map(|_| ())
    }

    /// Patients matching the filter, ascending by last name.
    pub async fn search(&self, filter: SearchFilter) -> Result<Vec<PatientRow>, StorageError> {
        self.execute(Intent::FilteredSearch(filter)).await
    }

    /// Create the `patients` table if missing.
    pub async fn init_schema(&self) -> Result<(), StorageError> {
        self.backend.init_schema().await
    }

    /// Readiness check.
    pub async fn ping(&self) -> Result<(), StorageError> {
        self.backend.ping().await
    }

    /// Close pooled connections.
    pub async fn close(&self) {
        self.backend.close().await;
    }
}
