use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::{EmployeeSource, SourceError};
use crate::types::EmployeeRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Json,
    Yaml,
}

/// Staff list kept in a JSON or YAML file (a top-level array of records).
/// The file is re-read on every fetch so edits show up without a restart.
#[derive(Debug, Clone)]
pub struct FileEmployeeSource {
    path: PathBuf,
    format: Format,
}

impl FileEmployeeSource {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let format = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("json") => Format::Json,
            Some("yaml") | Some("yml") => Format::Yaml,
            other => return Err(SourceError::UnsupportedFormat(other.unwrap_or("<none>").to_string())),
        };
        Ok(Self { path, format })
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<EmployeeRecord>, SourceError> {
        match self.format {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| SourceError::Parse(e.to_string())),
            Format::Yaml => serde_yaml::from_slice(bytes).map_err(|e| SourceError::Parse(e.to_string())),
        }
    }
}

#[async_trait]
impl EmployeeSource for FileEmployeeSource {
    async fn fetch_employees(&self) -> Result<Vec<EmployeeRecord>, SourceError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let records = self.parse(&bytes)?;
        debug!("Loaded {} staff records from {}", records.len(), self.path.display());
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
