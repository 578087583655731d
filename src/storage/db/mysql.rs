//! MySQL backend implementation using sqlx.
//!
//! Used for local development against a fixed host/user/database.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::MySql;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::storage::StorageError;
use crate::storage::backend::PatientBackend;
use crate::storage::db::{PoolSettings, search_query};
use crate::storage::schema::{Dialect, ORDER_BY_LAST_NAME};
use crate::storage::types::{
    BackendKind, NewPatient, Patient, PatientId, PatientRow, SearchFilter, now,
};

const DIALECT: Dialect = Dialect::MySql;

/// Local MySQL connection parameters.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MySqlSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "mydatabase".to_string(),
        }
    }
}

impl std::fmt::Debug for MySqlSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl MySqlSettings {
    fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

/// MySQL connection pool wrapper.
#[derive(Clone)]
pub struct MySqlBackend {
    pool: MySqlPool,
}

impl std::fmt::Debug for MySqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlBackend").finish_non_exhaustive()
    }
}

impl MySqlBackend {
    /// Create a lazily connecting pool for the given settings.
    pub fn connect_lazy(settings: &MySqlSettings, pool: PoolSettings) -> Self {
        let pool = MySqlPoolOptions::new()
            .max_connections(pool.max_connections)
            .acquire_timeout(pool.acquire_timeout)
            .connect_lazy_with(settings.connect_options());

        Self { pool }
    }

    /// Get the underlying sqlx pool for direct query execution.
    #[inline]
    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    async fn fetch_by_id(&self, id: PatientId) -> Result<Option<PatientRow>, StorageError> {
        let sql = format!("{} WHERE id = ?", DIALECT.select_rows());
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

/// Row for a committed insert whose re-read found nothing, e.g. because a
/// concurrent delete removed it first.
fn inserted_row(id: PatientId, patient: NewPatient) -> PatientRow {
    PatientRow::from_patient(&Patient::from_new(id, patient, now()))
}

#[async_trait]
impl PatientBackend for MySqlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mysql
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(DIALECT.create_table_ddl())
            .execute(&self.pool)
            .await?;
        tracing::info!("Database schema initialized");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PatientRow>, StorageError> {
        let sql = format!("{}{}", DIALECT.select_rows(), ORDER_BY_LAST_NAME);
        let rows = sqlx::query_as::<_, PatientRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, patient: NewPatient) -> Result<PatientRow, StorageError> {
        let bound = patient.clone();
        let result = sqlx::query(
            "INSERT INTO patients (first_name, last_name, contact_number, medical_history, \
             treatment_notes, last_visit_date) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(bound.first_name)
        .bind(bound.last_name)
        .bind(bound.contact_number)
        .bind(bound.medical_history)
        .bind(bound.treatment_notes)
        .bind(bound.last_visit_date)
        .execute(&self.pool)
        .await?;

        let id = PatientId::try_from(result.last_insert_id()).map_err(|_| {
            StorageError::InvalidData(format!(
                "insert id {} out of range",
                result.last_insert_id()
            ))
        })?;

        match self.fetch_by_id(id).await? {
            Some(row) => Ok(row),
            None => {
                tracing::debug!(id, "Inserted patient already gone, using bound values");
                Ok(inserted_row(id, patient))
            }
        }
    }

    async fn delete(&self, id: PatientId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<PatientRow>, StorageError> {
        let mut query = search_query::<MySql>(DIALECT, filter);
        let rows = query
            .build_query_as::<PatientRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
