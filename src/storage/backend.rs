//! Storage backend trait.
//!
//! Each storage technology implements [`PatientBackend`]; the
//! [`PatientStore`](crate::storage::PatientStore) gateway dispatches
//! [`Intent`](crate::storage::Intent)s to whichever one was selected at startup.

use async_trait::async_trait;

use crate::storage::StorageError;
use crate::storage::types::{BackendKind, NewPatient, PatientId, PatientRow, SearchFilter};

/// Abstract storage backend for patient records.
///
/// All operations are async and return explicit errors. List and search
/// results are ordered ascending by `last_name`.
#[async_trait]
pub trait PatientBackend: Send + Sync {
    /// Which storage technology this is.
    fn kind(&self) -> BackendKind;

    /// Create the `patients` table if it does not exist.
    async fn init_schema(&self) -> Result<(), StorageError>;

    /// All patients.
    async fn list_all(&self) -> Result<Vec<PatientRow>, StorageError>;

    /// Insert a patient and return the stored row with its assigned id.
    async fn insert(&self, patient: NewPatient) -> Result<PatientRow, StorageError>;

    /// Delete a patient by id. Returns whether a row was removed.
    async fn delete(&self, id: PatientId) -> Result<bool, StorageError>;

    /// Patients matching the filter.
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<PatientRow>, StorageError>;

    /// Check that the backend can serve queries.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Release pooled connections.
    async fn close(&self);
}
