//! Core data types for the storage layer.
//!
//! - [`NewPatient`]: Caller-supplied fields for an insert
//! - [`Patient`]: A stored record as held by the in-memory backend
//! - [`PatientRow`]: The row-mapping every backend returns, including the
//!   derived formatted-date columns
//! - [`SearchFilter`]: Optional text and visit-day filters for searches
//! - [`BackendKind`]: Which storage technology is bound for the process

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Patient identifier assigned by storage.
pub type PatientId = i32;

/// Display format of `formatted_created_date`.
pub const CREATED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display format of `formatted_last_visit_date`.
pub const LAST_VISIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Current timestamp as stored in the `patients` table.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Storage technology bound for the process lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackendKind {
    /// Cloud-hosted PostgreSQL over TLS.
    Postgres,
    /// Local MySQL.
    Mysql,
    /// Volatile process-local store.
    Memory,
}

/// Fields supplied when creating a patient.
///
/// Required fields are not validated here. An absent name is passed through
/// as `NULL` so relational backends reject it on `NOT NULL`; the memory
/// backend stores whatever it is given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub contact_number: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub treatment_notes: Option<String>,
    /// Set to the request time by every caller.
    #[serde(default)]
    pub last_visit_date: Option<NaiveDateTime>,
}

impl NewPatient {
    /// Create a patient with the two required names.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Default::default()
        }
    }

    pub fn with_contact_number(mut self, contact_number: impl Into<String>) -> Self {
        self.contact_number = Some(contact_number.into());
        self
    }

    pub fn with_last_visit_date(mut self, at: NaiveDateTime) -> Self {
        self.last_visit_date = Some(at);
        self
    }
}

/// A stored patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: Option<String>,
    pub medical_history: Option<String>,
    pub treatment_notes: Option<String>,
    pub last_visit_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Patient {
    /// Materialize a new record with the given id and creation time.
    pub fn from_new(id: PatientId, new: NewPatient, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            first_name: new.first_name.unwrap_or_default(),
            last_name: new.last_name.unwrap_or_default(),
            contact_number: new.contact_number,
            medical_history: new.medical_history,
            treatment_notes: new.treatment_notes,
            last_visit_date: new.last_visit_date,
            created_at,
        }
    }
}

/// Row-mapping returned by every backend.
///
/// Relational backends fill the `formatted_*` columns in SQL; the memory
/// backend derives them in [`PatientRow::from_patient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PatientRow {
    pub id: PatientId,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: Option<String>,
    pub medical_history: Option<String>,
    pub treatment_notes: Option<String>,
    pub last_visit_date: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub formatted_created_date: Option<String>,
    pub formatted_last_visit_date: Option<String>,
}

impl PatientRow {
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            contact_number: patient.contact_number.clone(),
            medical_history: patient.medical_history.clone(),
            treatment_notes: patient.treatment_notes.clone(),
            last_visit_date: patient.last_visit_date,
            created_at: Some(patient.created_at),
            formatted_created_date: Some(format_created_date(&patient.created_at)),
            formatted_last_visit_date: patient.last_visit_date.as_ref().map(format_last_visit_date),
        }
    }

    /// Column-name to value mapping of this row.
    pub fn into_mapping(self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    pub fn contact_number_display(&self) -> &str {
        self.contact_number.as_deref().unwrap_or("")
    }

    pub fn medical_history_display(&self) -> &str {
        self.medical_history.as_deref().unwrap_or("")
    }

    pub fn treatment_notes_display(&self) -> &str {
        self.treatment_notes.as_deref().unwrap_or("")
    }

    pub fn created_display(&self) -> &str {
        self.formatted_created_date.as_deref().unwrap_or("")
    }

    pub fn last_visit_display(&self) -> &str {
        self.formatted_last_visit_date.as_deref().unwrap_or("")
    }
}

pub fn format_created_date(at: &NaiveDateTime) -> String {
    at.format(CREATED_DATE_FORMAT).to_string()
}

pub fn format_last_visit_date(at: &NaiveDateTime) -> String {
    at.format(LAST_VISIT_DATE_FORMAT).to_string()
}

/// Filters for a patient search. Both stages are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Substring matched case-insensitively against first name, last name and
    /// contact number. `None` disables the text stage.
    pub term: Option<String>,
    /// Calendar day that `last_visit_date` must fall on.
    pub visit_date: Option<NaiveDate>,
}

impl SearchFilter {
    /// Build a filter, treating a blank term as absent.
    pub fn new(term: Option<String>, visit_date: Option<NaiveDate>) -> Self {
        Self {
            term: term.filter(|t| !t.trim().is_empty()),
            visit_date,
        }
    }

    /// `LIKE` pattern for the text stage.
    pub fn like_pattern(&self) -> Option<String> {
        self.term.as_ref().map(|t| format!("%{}%", t))
    }

    /// Apply both stages to an in-memory record.
    pub fn matches(&self, patient: &Patient) -> bool {
        self.matches_term(patient) && self.matches_visit_date(patient)
    }

    fn matches_term(&self, patient: &Patient) -> bool {
        let Some(term) = &self.term else {
            return true;
        };
        let needle = term.to_lowercase();
        let contains = |field: &str| field.to_lowercase().contains(&needle);

        contains(&patient.first_name)
            || contains(&patient.last_name)
            || patient.contact_number.as_deref().is_some_and(contains)
    }

    fn matches_visit_date(&self, patient: &Patient) -> bool {
        match (self.visit_date, patient.last_visit_date) {
            (None, _) => true,
            (Some(day), Some(visit)) => visit.date() == day,
            (Some(_), None) => false,
        }
    }
}
