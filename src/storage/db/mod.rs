//! Relational backends built on sqlx.
//!
//! - `PostgresBackend`: cloud-hosted PostgreSQL over TLS
//! - `MySqlBackend`: local MySQL
//!
//! Both pools connect lazily, so bad connection parameters surface on the
//! first query rather than at startup. The filtered-search `WHERE` clause is
//! shared: [`push_search_filter`] appends it to a `QueryBuilder` of either
//! database, and the builder numbers the placeholders (`$1..` or `?`).
//!
//! # Example
//!
//! ```ignore
//! let backend = PostgresBackend::connect_lazy(url, PoolSettings::default())?;
//! let rows = backend.list_all().await?;
//! ```

mod mysql;
mod postgres;

pub use mysql::{MySqlBackend, MySqlSettings};
pub use postgres::PostgresBackend;

use std::time::Duration;

use chrono::NaiveDate;
use sqlx::{Database, Encode, QueryBuilder, Type};

use crate::storage::schema::{Dialect, ORDER_BY_LAST_NAME};
use crate::storage::types::SearchFilter;

/// Default maximum connections per pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default time a caller waits for a free pooled connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(300);

/// Pool sizing shared by the relational backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

/// Append the search filter and ordering to a `SELECT ... FROM patients`.
pub(crate) fn push_search_filter<'args, DB>(
    query: &mut QueryBuilder<'args, DB>,
    dialect: Dialect,
    filter: &SearchFilter,
) where
    DB: Database,
    String: Encode<'args, DB> + Type<DB>,
    NaiveDate: Encode<'args, DB> + Type<DB>,
{
    let like = dialect.like_operator();

    query.push(" WHERE 1=1");

    if let Some(pattern) = filter.like_pattern() {
        query.push(format!(" AND (first_name {like} "));
        query.push_bind(pattern.clone());
        query.push(format!(" OR last_name {like} "));
        query.push_bind(pattern.clone());
        query.push(format!(" OR contact_number {like} "));
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(day) = filter.visit_date {
        query.push(" AND DATE(last_visit_date) = ");
        query.push_bind(day);
    }

    query.push(ORDER_BY_LAST_NAME);
}

/// Build the full filtered-search query for a dialect.
pub(crate) fn search_query<'args, DB>(
    dialect: Dialect,
    filter: &SearchFilter,
) -> QueryBuilder<'args, DB>
where
    DB: Database,
    DB::Arguments<'args>: Default,
    String: Encode<'args, DB> + Type<DB>,
    NaiveDate: Encode<'args, DB> + Type<DB>,
{
    let mut query = QueryBuilder::new(dialect.select_rows());
    push_search_filter(&mut query, dialect, filter);
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{MySql, Postgres};

    fn full_filter() -> SearchFilter {
        SearchFilter::new(
            Some("Smith".to_string()),
            NaiveDate::from_ymd_opt(2024, 3, 9),
        )
    }

    #[test]
    fn test_postgres_placeholders_are_numbered() {
        let query = search_query::<Postgres>(Dialect::Postgres, &full_filter());
        let sql = query.sql();
        assert!(sql.contains("first_name ILIKE $1"));
        assert!(sql.contains("last_name ILIKE $2"));
        assert!(sql.contains("contact_number ILIKE $3"));
        assert!(sql.contains("DATE(last_visit_date) = $4"));
        assert!(sql.ends_with("ORDER BY last_name ASC"));
    }

    #[test]
    fn test_postgres_date_only_starts_at_first_placeholder() {
        let filter = SearchFilter::new(None, NaiveDate::from_ymd_opt(2024, 3, 9));
        let query = search_query::<Postgres>(Dialect::Postgres, &filter);
        let sql = query.sql();
        assert!(sql.contains("DATE(last_visit_date) = $1"));
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn test_mysql_uses_question_marks() {
        let query = search_query::<MySql>(Dialect::MySql, &full_filter());
        let sql = query.sql();
        assert!(sql.contains("first_name LIKE ?"));
        assert!(sql.contains("contact_number LIKE ?"));
        assert!(sql.contains("DATE(last_visit_date) = ?"));
        assert!(!sql.contains('$'));
        assert!(sql.contains("DATE_FORMAT(created_at"));
    }

    #[test]
    fn test_empty_filter_has_no_conditions() {
        let query = search_query::<MySql>(Dialect::MySql, &SearchFilter::default());
        assert!(query.sql().ends_with("FROM patients WHERE 1=1 ORDER BY last_name ASC"));
    }
}
