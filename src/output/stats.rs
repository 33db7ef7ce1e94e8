//! Statistics generation from the corpus database
//!
//! This module provides functionality for extracting and displaying
//! per-partition record counts and the latest run of each partition.

use crate::output::OutputResult;
use crate::record::Partition;
use crate::storage::{RunRecord, SqliteCorpus};

/// One partition's line in the statistics view
#[derive(Debug, Clone)]
pub struct PartitionStatistics {
    pub partition: Partition,
    pub records: u64,
    pub latest_run: Option<RunRecord>,
}

/// Corpus statistics summary
#[derive(Debug, Clone)]
pub struct CorpusStatistics {
    /// Records across all partitions
    pub total_records: u64,

    /// Partitions ordered by venue and year
    pub partitions: Vec<PartitionStatistics>,
}

/// Loads statistics from the corpus
pub fn load_statistics(corpus: &SqliteCorpus) -> OutputResult<CorpusStatistics> {
    let mut partitions = Vec::new();
    let mut total_records = 0;

    for (partition, records) in corpus.list_partitions()? {
        total_records += records;
        let latest_run = corpus.latest_run(&partition)?;
        partitions.push(PartitionStatistics {
            partition,
            records,
            latest_run,
        });
    }

    Ok(CorpusStatistics {
        total_records,
        partitions,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CorpusStatistics) {
    println!("=== Corpus Statistics ===\n");

    println!("Overview:");
    println!("  Partitions: {}", stats.partitions.len());
    println!("  Total records: {}", stats.total_records);
    println!();

    if stats.partitions.is_empty() {
        println!("No records stored yet.");
        return;
    }

    println!("Records by Partition:");
    for entry in &stats.partitions {
        let share = if stats.total_records > 0 {
            (entry.records as f64 / stats.total_records as f64) * 100.0
        } else {
            0.0
        };
        print!("  {:<20} {:>7} ({:.1}%)", entry.partition.key(), entry.records, share);

        match &entry.latest_run {
            Some(run) => println!(
                "  last run #{} {} ({} new, {} dropped, {} failed fetches)",
                run.id,
                run.status.to_db_string(),
                run.counts.records_emitted,
                run.counts.records_dropped,
                run.counts.fetch_failures
            ),
            None => println!(),
        }
    }
}
