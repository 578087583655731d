//! Patient Records - server-rendered patient CRUD
//!
//! This crate provides the data-access layer and HTTP surface of a small
//! patient record application. It can be used as a library, or run as a
//! standalone binary with the `patient-records` executable.
//!
//! # Architecture
//!
//! - **Storage**: One query execution gateway over PostgreSQL, MySQL or a
//!   volatile in-memory store, chosen once at startup
//! - **Server**: Axum routes rendering Askama templates
//! - **Config**: YAML file plus CLI/environment overrides
//!
//! # Example
//!
//! ```rust,no_run
//! use patient_records::storage::{NewPatient, StorageBuilder};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = StorageBuilder::memory().build()?;
//! let row = store.insert(NewPatient::new("Ann", "Lee")).await?;
//! store.delete(row.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod server;
pub mod storage;

pub use storage::{
    BackendKind, BackendSelection, EnvironmentSignals, Intent, NewPatient, PatientRow,
    PatientStore, SearchFilter, StorageBuilder, StorageError,
};
