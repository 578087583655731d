//! Storage Layer
//!
//! One data-access contract over three interchangeable backends:
//! - **PostgreSQL**: cloud-hosted, reached through a connection URL over TLS
//! - **MySQL**: local development database
//! - **Memory**: volatile process-local fallback
//!
//! # Components
//!
//! - [`BackendSelection`]: Picks exactly one backend from [`EnvironmentSignals`]
//! - [`StorageBuilder`]: Builds the selected backend into a [`PatientStore`]
//! - [`PatientStore`]: Query execution gateway; runs [`Intent`]s
//! - [`PatientBackend`]: Trait every backend implements

mod backend;
mod builder;
pub mod db;
mod error;
mod facades;
mod intent;
mod memory;
mod schema;
mod selector;
mod types;

pub use backend::PatientBackend;
pub use builder::StorageBuilder;
pub use db::{MySqlBackend, MySqlSettings, PoolSettings, PostgresBackend};
pub use error::StorageError;
pub use facades::PatientStore;
pub use intent::Intent;
pub use memory::MemoryBackend;
pub use schema::Dialect;
pub use selector::{BackendSelection, EnvironmentSignals};
pub use types::{
    BackendKind, NewPatient, Patient, PatientId, PatientRow, SearchFilter, format_created_date,
    format_last_visit_date, now,
};
