//! SQL dialects: table definitions and the shared `SELECT` projection.

/// SQL dialect of a relational backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
}

/// PostgreSQL table definition.
pub const POSTGRES_PATIENTS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS patients (
    id              SERIAL PRIMARY KEY,
    first_name      VARCHAR(100) NOT NULL,
    last_name       VARCHAR(100) NOT NULL,
    contact_number  VARCHAR(15),
    medical_history TEXT,
    treatment_notes TEXT,
    last_visit_date TIMESTAMP,
    created_at      TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

/// MySQL table definition.
pub const MYSQL_PATIENTS_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS patients (
    id              INT AUTO_INCREMENT PRIMARY KEY,
    first_name      VARCHAR(100) NOT NULL,
    last_name       VARCHAR(100) NOT NULL,
    contact_number  VARCHAR(15),
    medical_history TEXT,
    treatment_notes TEXT,
    last_visit_date DATETIME,
    created_at      TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Stored columns, in row order.
const PATIENT_COLUMNS: &str = "id, first_name, last_name, contact_number, medical_history, \
     treatment_notes, last_visit_date, created_at";

impl Dialect {
    pub fn create_table_ddl(&self) -> &'static str {
        match self {
            Self::Postgres => POSTGRES_PATIENTS_TABLE_DDL,
            Self::MySql => MYSQL_PATIENTS_TABLE_DDL,
        }
    }

    /// Derived `formatted_created_date` / `formatted_last_visit_date` columns.
    pub fn formatted_date_columns(&self) -> &'static str {
        match self {
            Self::Postgres => {
                "to_char(created_at, 'YYYY-MM-DD HH24:MI:SS') AS formatted_created_date, \
                 to_char(last_visit_date, 'YYYY-MM-DD HH24:MI') AS formatted_last_visit_date"
            }
            Self::MySql => {
                "DATE_FORMAT(created_at, '%Y-%m-%d %H:%i:%s') AS formatted_created_date, \
                 DATE_FORMAT(last_visit_date, '%Y-%m-%d %H:%i') AS formatted_last_visit_date"
            }
        }
    }

    /// Column list of a [`PatientRow`](crate::storage::PatientRow), without `SELECT`.
    pub fn row_projection(&self) -> String {
        format!("{}, {}", PATIENT_COLUMNS, self.formatted_date_columns())
    }

    /// `SELECT ... FROM patients` with no filter or ordering.
    pub fn select_rows(&self) -> String {
        format!("SELECT {} FROM patients", self.row_projection())
    }

    /// Case-insensitive pattern operator.
    pub fn like_operator(&self) -> &'static str {
        match self {
            Self::Postgres => "ILIKE",
            // Default collations are case-insensitive.
            Self::MySql => "LIKE",
        }
    }
}

pub const ORDER_BY_LAST_NAME: &str = " ORDER BY last_name ASC";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_dialects() {
        assert!(Dialect::Postgres.create_table_ddl().contains("SERIAL PRIMARY KEY"));
        assert!(Dialect::MySql.create_table_ddl().contains("AUTO_INCREMENT"));
        for dialect in [Dialect::Postgres, Dialect::MySql] {
            assert!(dialect.create_table_ddl().contains("IF NOT EXISTS patients"));
        }
    }

    #[test]
    fn test_select_projection() {
        let pg = Dialect::Postgres.select_rows();
        assert!(pg.starts_with("SELECT id, first_name"));
        assert!(pg.contains("to_char(created_at, 'YYYY-MM-DD HH24:MI:SS')"));
        assert!(pg.ends_with("FROM patients"));

        let my = Dialect::MySql.select_rows();
        assert!(my.contains("DATE_FORMAT(last_visit_date, '%Y-%m-%d %H:%i')"));
        assert!(my.contains("AS formatted_last_visit_date"));
    }
}
