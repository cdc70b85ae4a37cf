use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Share link not found")]
    NotFound,

    #[error("Share link expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    #[error("Snapshot store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
