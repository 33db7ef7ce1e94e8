//! Storage traits and error types

use crate::record::PaperRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for validated paper records
///
/// Appending is idempotent per partition: a record whose `source_url` is
/// already stored for the same venue/year is ignored.
pub trait CorpusSink: Send {
    /// Appends a record, returning `false` when it was already present
    fn append(&mut self, record: &PaperRecord) -> StorageResult<bool>;
}
