//! Corpus storage
//!
//! This module persists the corpus and the run ledger in SQLite:
//! - Schema management
//! - Idempotent record appends keyed by venue, year and source URL
//! - Run tracking with per-run counters
//! - Partition queries for export and statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCorpus;
pub use traits::{CorpusSink, StorageError, StorageResult};

use crate::record::Partition;
use std::path::Path;

/// Opens or creates the corpus database at `path`
pub fn open_corpus(path: &Path) -> StorageResult<SqliteCorpus> {
    SqliteCorpus::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub partition: Partition,
    pub config_hash: String,
    pub status: RunStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub counts: RunCounts,
}

/// Counters stored with a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub records_emitted: u64,
    pub records_dropped: u64,
    pub fetch_failures: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
