//! Database schema definitions
//!
//! This module contains the SQL schema for the corpus database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per venue/year crawl invocation
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    venue TEXT NOT NULL,
    year INTEGER NOT NULL,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    records_emitted INTEGER NOT NULL DEFAULT 0,
    records_dropped INTEGER NOT NULL DEFAULT 0,
    fetch_failures INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_runs_partition ON runs(venue, year);

-- The corpus, in insertion order within each partition
CREATE TABLE IF NOT EXISTS papers (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    venue TEXT NOT NULL,
    year INTEGER NOT NULL,
    title TEXT NOT NULL,
    authors TEXT NOT NULL,
    abstract TEXT NOT NULL,
    source_url TEXT NOT NULL,
    discovered_run INTEGER REFERENCES runs(id),
    inserted_at TEXT NOT NULL,
    UNIQUE(venue, year, source_url)
);

CREATE INDEX IF NOT EXISTS idx_papers_partition ON papers(venue, year);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
