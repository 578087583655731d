//! Volatile in-memory backend.
//!
//! Used when the process runs on a hosting platform without a database.
//! Records live only as long as the process. Each operation runs entirely
//! under one lock, so operations are atomic with respect to each other but
//! there is no isolation across requests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::storage::StorageError;
use crate::storage::backend::PatientBackend;
use crate::storage::types::{
    BackendKind, NewPatient, Patient, PatientId, PatientRow, SearchFilter, now,
};

#[derive(Debug)]
struct MemoryState {
    next_id: PatientId,
    patients: Vec<Patient>,
}

/// Process-local patient list with a monotonic id counter starting at 1.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                patients: Vec::new(),
            }),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.state.lock().await.patients.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Rows passing `keep`, stable-sorted by `last_name`.
    async fn collect_sorted(&self, keep: impl Fn(&Patient) -> bool) -> Vec<PatientRow> {
        let state = self.state.lock().await;
        let mut rows: Vec<PatientRow> = state
            .patients
            .iter()
            .filter(|p| keep(p))
            .map(PatientRow::from_patient)
            .collect();
        rows.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        rows
    }
}

#[async_trait]
impl PatientBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PatientRow>, StorageError> {
        Ok(self.collect_sorted(|_| true).await)
    }

    async fn insert(&self, patient: NewPatient) -> Result<PatientRow, StorageError> {
        let mut state = self.state.lock().await;

        let id = state.next_id;
        state.next_id = id
            .checked_add(1)
            .ok_or_else(|| StorageError::Internal("patient id counter exhausted".to_string()))?;

        let record = Patient::from_new(id, patient, now());
        let row = PatientRow::from_patient(&record);
        state.patients.push(record);

        Ok(row)
    }

    async fn delete(&self, id: PatientId) -> Result<bool, StorageError> {
        let mut state = self.state.lock().await;
        match state.patients.iter().position(|p| p.id == id) {
            Some(index) => {
                state.patients.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<PatientRow>, StorageError> {
        Ok(self.collect_sorted(|p| filter.matches(p)).await)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[tokio::test]
    async fn test_ids_start_at_one_and_increase() {
        let backend = MemoryBackend::new();
        let a = backend.insert(NewPatient::new("Ann", "Lee")).await.unwrap();
        let b = backend.insert(NewPatient::new("Bob", "Ames")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        backend.delete(b.id).await.unwrap();
        let c = backend.insert(NewPatient::new("Cy", "Cho")).await.unwrap();
        assert_eq!(c.id, 3, "ids are never reused");
    }

    #[tokio::test]
    async fn test_list_sorted_by_last_name_case_sensitive() {
        let backend = MemoryBackend::new();
        for (first, last) in [("Ann", "Lee"), ("Bob", "Ames"), ("Cy", "adams")] {
            backend.insert(NewPatient::new(first, last)).await.unwrap();
        }

        let names: Vec<_> = backend
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.last_name)
            .collect();
        assert_eq!(names, vec!["Ames", "Lee", "adams"]);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let backend = MemoryBackend::new();
        backend.insert(NewPatient::new("First", "Same")).await.unwrap();
        backend.insert(NewPatient::new("Second", "Same")).await.unwrap();

        let rows = backend.list_all().await.unwrap();
        assert_eq!(rows[0].first_name, "First");
        assert_eq!(rows[1].first_name, "Second");
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let backend = MemoryBackend::new();
        backend.insert(NewPatient::new("Ann", "Lee")).await.unwrap();

        assert!(!backend.delete(42).await.unwrap());
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_sets_created_at_and_formats() {
        let backend = MemoryBackend::new();
        let visit = at("2024-05-06 07:08:09");
        let row = backend
            .insert(NewPatient::new("Ann", "Lee").with_last_visit_date(visit))
            .await
            .unwrap();

        assert!(row.created_at.is_some());
        assert_eq!(row.formatted_last_visit_date.as_deref(), Some("2024-05-06 07:08"));
        assert_eq!(row.formatted_created_date.as_ref().map(String::len), Some(19));
    }

    #[tokio::test]
    async fn test_empty_required_fields_are_stored() {
        let backend = MemoryBackend::new();
        let row = backend.insert(NewPatient::default()).await.unwrap();
        assert_eq!(row.first_name, "");
        assert!(!backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_search_term_and_date() {
        let backend = MemoryBackend::new();
        backend
            .insert(
                NewPatient::new("John", "Smith").with_last_visit_date(at("2024-03-09 08:00:00")),
            )
            .await
            .unwrap();
        backend
            .insert(
                NewPatient::new("Jane", "Doe")
                    .with_contact_number("SMITH-555")
                    .with_last_visit_date(at("2024-03-10 08:00:00")),
            )
            .await
            .unwrap();
        backend
            .insert(NewPatient::new("Ed", "Brown"))
            .await
            .unwrap();

        let by_term = backend
            .search(&SearchFilter::new(Some("smith".to_string()), None))
            .await
            .unwrap();
        assert_eq!(by_term.len(), 2);
        assert_eq!(by_term[0].last_name, "Doe");

        let by_both = backend
            .search(&SearchFilter::new(
                Some("smith".to_string()),
                NaiveDate::from_ymd_opt(2024, 3, 9),
            ))
            .await
            .unwrap();
        assert_eq!(by_both.len(), 1);
        assert_eq!(by_both[0].first_name, "John");

        let blank = backend
            .search(&SearchFilter::new(Some("  ".to_string()), None))
            .await
            .unwrap();
        assert_eq!(blank, backend.list_all().await.unwrap());
    }
}
