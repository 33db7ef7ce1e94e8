//! Output module for exporting the corpus and reporting on it
//!
//! This module handles:
//! - Writing partition exports as JSON files for the indexing side
//! - Corpus and run statistics for the `--stats` view

mod json;
pub mod stats;

pub use json::{export_all, export_partition, read_export, ExportOutcome};
pub use stats::{load_statistics, print_statistics, CorpusStatistics, PartitionStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
