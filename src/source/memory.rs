use async_trait::async_trait;

use super::{EmployeeSource, SourceError};
use crate::types::EmployeeRecord;

/// Fixed staff list held in memory. Serves the empty chart when no source is
/// configured, and test data in router and state tests.
#[derive(Debug, Default)]
pub struct MemoryEmployeeSource {
    records: Vec<EmployeeRecord>,
}

impl MemoryEmployeeSource {
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl EmployeeSource for MemoryEmployeeSource {
    async fn fetch_employees(&self) -> Result<Vec<EmployeeRecord>, SourceError> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("memory ({} records)", self.records.len())
    }
}
