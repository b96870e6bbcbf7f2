use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to open store {}: {source}", path.display())]
    StorageConnection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("store query failed: {0}")]
    StorageQuery(#[from] rusqlite::Error),

    #[error("store query failed: {0}")]
    StorageQueryMessage(String),

    #[error("data format error: {0}")]
    DataFormat(String),

    #[error("invalid judgment: {0}")]
    InvalidJudgment(String),

    #[error("no current record")]
    NoCurrentRecord,
}

impl ReviewError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReviewError::InvalidJudgment(_) | ReviewError::DataFormat(_)
        )
    }
}
