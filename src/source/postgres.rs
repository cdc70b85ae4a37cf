use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};

use super::{EmployeeSource, SourceError};
use crate::types::{EmployeeId, EmployeeRecord};

/// Staff list read from a PostgreSQL table.
///
/// Expected columns: `id`, `name`, `title`, `department`, `manager_id`,
/// `photo`, `contact`. Ids of any type are read as text.
pub struct PgEmployeeSource {
    pool: PgPool,
    table: String,
}

impl PgEmployeeSource {
    pub async fn connect(database_url: &str, table: &str, max_connections: u32) -> Result<Self, SourceError> {
        if !Self::is_valid_table_name(table) {
            return Err(SourceError::InvalidTable(table.to_string()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("Connected staff source to table \"{}\"", table);

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Table names are interpolated into SQL, so only plain identifiers pass.
    fn is_valid_table_name(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && name.len() <= 63
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT id::text AS id, name, COALESCE(title, '') AS title, \
             COALESCE(department, '') AS department, manager_id::text AS manager_id, \
             photo, contact FROM \"{}\" ORDER BY name, id",
            self.table
        )
    }
}

#[async_trait]
impl EmployeeSource for PgEmployeeSource {
    async fn fetch_employees(&self) -> Result<Vec<EmployeeRecord>, SourceError> {
        let rows = sqlx::query(&self.select_sql()).fetch_all(&self.pool).await?;

        let records = rows
            .iter()
            .map(|row| {
                Ok(EmployeeRecord {
                    id: EmployeeId::new(row.try_get::<String, _>("id")?),
                    name: row.try_get("name")?,
                    title: row.try_get("title")?,
                    department: row.try_get("department")?,
                    manager_id: row.try_get::<Option<String>, _>("manager_id")?.map(EmployeeId::new),
                    photo: row.try_get("photo")?,
                    contact: row.try_get("contact")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        debug!("Fetched {} staff records from \"{}\"", records.len(), self.table);
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("postgres:{}", self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(PgEmployeeSource::is_valid_table_name("staff"));
        assert!(PgEmployeeSource::is_valid_table_name("_staff_2024"));
        assert!(!PgEmployeeSource::is_valid_table_name(""));
        assert!(!PgEmployeeSource::is_valid_table_name("2staff"));
        assert!(!PgEmployeeSource::is_valid_table_name("staff\"; DROP TABLE x; --"));
        assert!(!PgEmployeeSource::is_valid_table_name(&"s".repeat(64)));
    }
}
