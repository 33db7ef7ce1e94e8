//! SQLite corpus implementation

use crate::record::{Partition, PaperRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CorpusSink, StorageError, StorageResult};
use crate::storage::{RunCounts, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::Duration;

const RUN_COLUMNS: &str = "id, venue, year, config_hash, status, started_at, finished_at,
     records_emitted, records_dropped, fetch_failures";

/// SQLite-backed corpus and run ledger
///
/// Records appended while a run is open are tagged with that run's id.
pub struct SqliteCorpus {
    conn: Connection,
    current_run: Option<i64>,
}

impl SqliteCorpus {
    /// Opens or creates the database file, creating parent directories
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // concurrent crawls each hold their own connection to the same file
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            current_run: None,
        })
    }

    /// Creates an in-memory database
    #[cfg(test)]
    pub(crate) fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            current_run: None,
        })
    }

    // ===== Run Management =====

    /// Records the start of a crawl and tags subsequent appends with it
    pub fn begin_run(&mut self, partition: &Partition, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (venue, year, config_hash, status, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                partition.venue,
                partition.year,
                config_hash,
                RunStatus::Running.to_db_string(),
                now
            ],
        )?;
        let run_id = self.conn.last_insert_rowid();
        self.current_run = Some(run_id);
        Ok(run_id)
    }

    /// Closes a run with its final status and counters
    pub fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counts: RunCounts,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, records_emitted = ?3,
             records_dropped = ?4, fetch_failures = ?5 WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                counts.records_emitted as i64,
                counts.records_dropped as i64,
                counts.fetch_failures as i64,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        if self.current_run == Some(run_id) {
            self.current_run = None;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    /// Most recent run for a partition
    pub fn latest_run(&self, partition: &Partition) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM runs WHERE venue = ?1 AND year = ?2 ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                params![partition.venue, partition.year],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    // ===== Corpus Queries =====

    pub fn count_records(&self, partition: &Partition) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM papers WHERE venue = ?1 AND year = ?2",
            params![partition.venue, partition.year],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// All records of a partition in insertion order
    pub fn load_partition(&self, partition: &Partition) -> StorageResult<Vec<PaperRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT title, authors, abstract, venue, year, source_url
             FROM papers WHERE venue = ?1 AND year = ?2 ORDER BY seq",
        )?;

        let records = stmt
            .query_map(params![partition.venue, partition.year], |row| {
                Ok(PaperRecord {
                    title: row.get(0)?,
                    authors: row.get(1)?,
                    abstract_text: row.get(2)?,
                    venue: row.get(3)?,
                    year: row.get(4)?,
                    source_url: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Every stored partition with its record count, ordered by venue and year
    pub fn list_partitions(&self) -> StorageResult<Vec<(Partition, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT venue, year, COUNT(*) FROM papers GROUP BY venue, year ORDER BY venue, year",
        )?;

        let partitions = stmt
            .query_map([], |row| {
                Ok((
                    Partition::new(row.get::<_, String>(0)?, row.get(1)?),
                    row.get::<_, i64>(2)? as u64,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(partitions)
    }
}

impl CorpusSink for SqliteCorpus {
    fn append(&mut self, record: &PaperRecord) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO papers
             (venue, year, title, authors, abstract, source_url, discovered_run, inserted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.venue,
                record.year,
                record.title,
                record.authors,
                record.abstract_text,
                record.source_url,
                self.current_run,
                now
            ],
        )?;
        Ok(inserted > 0)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        partition: Partition::new(row.get::<_, String>(1)?, row.get(2)?),
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Failed),
        started_at: row.get(5)?,
        finished_at: row.get(6)?,
        counts: RunCounts {
            records_emitted: row.get::<_, i64>(7)? as u64,
            records_dropped: row.get::<_, i64>(8)? as u64,
            fetch_failures: row.get::<_, i64>(9)? as u64,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(venue: &str, year: u16, url: &str) -> PaperRecord {
        PaperRecord {
            title: format!("Paper at {}", url),
            authors: "Ada Lovelace".to_string(),
            abstract_text: "An abstract.".to_string(),
            venue: venue.to_string(),
            year,
            source_url: url.to_string(),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let corpus = SqliteCorpus::new_in_memory();
        assert!(corpus.is_ok());
    }

    #[test]
    fn test_append_is_idempotent_per_partition() {
        let mut corpus = SqliteCorpus::new_in_memory().unwrap();
        let partition = Partition::new("ICML", 2023);

        assert!(corpus.append(&record("ICML", 2023, "https://x.org/1")).unwrap());
        assert!(!corpus.append(&record("ICML", 2023, "https://x.org/1")).unwrap());
        assert!(corpus.append(&record("ICML", 2023, "https://x.org/2")).unwrap());
        // same URL in another partition is a different record
        assert!(corpus.append(&record("ICML", 2022, "https://x.org/1")).unwrap());

        assert_eq!(corpus.count_records(&partition).unwrap(), 2);
    }

    #[test]
    fn test_load_partition_keeps_insertion_order() {
        let mut corpus = SqliteCorpus::new_in_memory().unwrap();
        for url in ["https://x.org/b", "https://x.org/a", "https://x.org/c"] {
            corpus.append(&record("IJCAI", 2021, url)).unwrap();
        }

        let loaded = corpus.load_partition(&Partition::new("IJCAI", 2021)).unwrap();
        let urls: Vec<_> = loaded.iter().map(|r| r.source_url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.org/b", "https://x.org/a", "https://x.org/c"]);
        assert_eq!(loaded[0], record("IJCAI", 2021, "https://x.org/b"));
    }

    #[test]
    fn test_run_lifecycle() {
        let mut corpus = SqliteCorpus::new_in_memory().unwrap();
        let partition = Partition::new("NeurIPS", 2023);

        let run_id = corpus.begin_run(&partition, "hash").unwrap();
        let run = corpus.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.finished_at.is_none());

        let counts = RunCounts {
            records_emitted: 3,
            records_dropped: 1,
            fetch_failures: 2,
        };
        corpus.finish_run(run_id, RunStatus::Completed, counts).unwrap();

        let run = corpus.latest_run(&partition).unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.counts, counts);
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_finish_unknown_run() {
        let mut corpus = SqliteCorpus::new_in_memory().unwrap();
        let result = corpus.finish_run(42, RunStatus::Failed, RunCounts::default());
        assert!(matches!(result, Err(StorageError::RunNotFound(42))));
        assert!(matches!(corpus.get_run(42), Err(StorageError::RunNotFound(42))));
    }

    #[test]
    fn test_list_partitions() {
        let mut corpus = SqliteCorpus::new_in_memory().unwrap();
        corpus.append(&record("NeurIPS", 2023, "https://x.org/1")).unwrap();
        corpus.append(&record("AAAI", 2024, "https://x.org/2")).unwrap();
        corpus.append(&record("AAAI", 2024, "https://x.org/3")).unwrap();

        let partitions = corpus.list_partitions().unwrap();
        assert_eq!(
            partitions,
            vec![
                (Partition::new("AAAI", 2024), 2),
                (Partition::new("NeurIPS", 2023), 1),
            ]
        );
    }

    #[test]
    fn test_reopen_file_keeps_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("corpus.db");

        {
            let mut corpus = SqliteCorpus::new(&path).unwrap();
            corpus.append(&record("EMNLP", 2023, "https://x.org/1")).unwrap();
        }

        let corpus = SqliteCorpus::new(&path).unwrap();
        assert_eq!(
            corpus.count_records(&Partition::new("EMNLP", 2023)).unwrap(),
            1
        );
    }
}
