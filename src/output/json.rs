//! Partition export files
//!
//! Each partition is written to `{venue}_{year}.json` as an array of
//! `{title, authors, abstract, venue, year, source_url}` objects. An export
//! whose record count already matches the corpus is left untouched, so the
//! indexing side can rely on unchanged files meaning unchanged partitions.

use crate::output::OutputResult;
use crate::record::{PaperRecord, Partition};
use crate::storage::SqliteCorpus;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// What happened to one export file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, records: usize },
    Unchanged { path: PathBuf, records: usize },
}

impl ExportOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written { path, .. } | Self::Unchanged { path, .. } => path,
        }
    }

    pub fn records(&self) -> usize {
        match self {
            Self::Written { records, .. } | Self::Unchanged { records, .. } => *records,
        }
    }
}

/// Writes one partition to `dir/{venue}_{year}.json`
pub fn export_partition(
    corpus: &SqliteCorpus,
    partition: &Partition,
    dir: &Path,
) -> OutputResult<ExportOutcome> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", partition.key()));
    let records = corpus.load_partition(partition)?;

    if path.exists() {
        match read_export(&path) {
            Ok(existing) if existing.len() == records.len() => {
                tracing::info!(path = %path.display(), records = records.len(), "Export is up to date");
                return Ok(ExportOutcome::Unchanged {
                    path,
                    records: records.len(),
                });
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Replacing unreadable export");
            }
        }
    }

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writer.flush()?;

    tracing::info!(path = %path.display(), records = records.len(), "Exported partition");
    Ok(ExportOutcome::Written {
        path,
        records: records.len(),
    })
}

/// Exports every stored partition into `dir`
pub fn export_all(corpus: &SqliteCorpus, dir: &Path) -> OutputResult<Vec<ExportOutcome>> {
    corpus
        .list_partitions()?
        .iter()
        .map(|(partition, _)| export_partition(corpus, partition, dir))
        .collect()
}

/// Reads an export file back
pub fn read_export(path: &Path) -> OutputResult<Vec<PaperRecord>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
