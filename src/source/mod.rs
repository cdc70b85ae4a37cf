//! Staff-data collaborator: anything that can hand over the current list of
//! employee records. The hierarchy engine never writes through it.

pub mod file;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::EmployeeRecord;

pub use file::FileEmployeeSource;
pub use memory::MemoryEmployeeSource;
pub use postgres::PgEmployeeSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read staff file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse staff file: {0}")]
    Parse(String),

    #[error("Unsupported staff file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid staff table name: {0}")]
    InvalidTable(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait EmployeeSource: Send + Sync {
    async fn fetch_employees(&self) -> Result<Vec<EmployeeRecord>, SourceError>;

    /// Short label for logs and the service info endpoint.
    fn describe(&self) -> String;
}
