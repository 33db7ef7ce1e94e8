//! Crawler module for venue/year crawls
//!
//! This module contains the core crawling logic, including:
//! - Static and browser-rendered page fetching with retry logic
//! - Per-host politeness shared by every crawl in the process
//! - The per-crawl visited set
//! - The crawl engine state machine
//! - Run bookkeeping around each crawl

mod browser;
mod engine;
mod fetcher;
mod politeness;
mod retry;
mod visited;

pub use browser::BrowserPool;
pub use engine::{CrawlEngine, CrawlReport, CrawlTask, EngineSettings, TaskKind};
pub use fetcher::{
    build_http_client, AttemptError, FetchFailed, FetchRequest, FetchedPage, Fetcher, PageFetcher,
    ReadyCondition, RenderingMode,
};
pub use politeness::Politeness;
pub use retry::RetryPolicy;
pub use visited::{Visit, VisitedSet};

use crate::config::Config;
use crate::record::Partition;
use crate::storage::{open_corpus, RunCounts, RunStatus, SqliteCorpus};
use crate::venues::{adapter_for, VenueAdapter};
use crate::HarvestError;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One venue/year to crawl
pub struct CrawlJob {
    pub adapter: Box<dyn VenueAdapter>,
    pub year: u16,
}

impl CrawlJob {
    pub fn new(adapter: Box<dyn VenueAdapter>, year: u16) -> Self {
        Self { adapter, year }
    }

    /// Looks the venue up in the registry
    pub fn for_venue(venue: &str, year: u16) -> Result<Self, HarvestError> {
        let adapter =
            adapter_for(venue).ok_or_else(|| HarvestError::UnsupportedVenue(venue.to_string()))?;
        Ok(Self::new(adapter, year))
    }

    pub fn partition(&self) -> Partition {
        Partition::new(self.adapter.name(), self.year)
    }
}

/// Builds the engine described by `config`, with a fresh limiter and browser pool
pub fn build_engine(config: &Config) -> Result<CrawlEngine<Arc<Fetcher>>, HarvestError> {
    let fetcher = Fetcher::from_config(config)?;
    Ok(CrawlEngine::new(
        Arc::new(fetcher),
        EngineSettings::from_config(&config.crawler),
    ))
}

/// Runs one crawl and records it in the run ledger
///
/// The run is marked `failed` when the crawl cannot start, `completed`
/// otherwise (including crawls that found nothing).
pub async fn run_recorded<F: PageFetcher>(
    engine: &CrawlEngine<F>,
    job: &CrawlJob,
    corpus: &mut SqliteCorpus,
    config_hash: &str,
) -> Result<CrawlReport, HarvestError> {
    let run_id = corpus.begin_run(&job.partition(), config_hash)?;

    match engine.run(job.adapter.as_ref(), job.year, corpus).await {
        Ok(report) => {
            corpus.finish_run(run_id, RunStatus::Completed, report.counts())?;
            Ok(report)
        }
        Err(e) => {
            if let Err(storage_error) =
                corpus.finish_run(run_id, RunStatus::Failed, RunCounts::default())
            {
                tracing::warn!(run_id, error = %storage_error, "Could not mark run as failed");
            }
            Err(e)
        }
    }
}

/// Runs several crawls concurrently against one engine
///
/// The crawls share the engine's politeness limiter and browser pool but
/// nothing else: each gets its own crawl context and its own database
/// connection. Results come back in job order.
pub async fn run_jobs<F: PageFetcher>(
    engine: &CrawlEngine<F>,
    jobs: Vec<CrawlJob>,
    database_path: &Path,
    config_hash: &str,
) -> Vec<Result<CrawlReport, HarvestError>> {
    let crawls = jobs.into_iter().map(|job| async move {
        let mut corpus = open_corpus(database_path)?;
        run_recorded(engine, &job, &mut corpus, config_hash).await
    });
    join_all(crawls).await
}

/// Crawls one venue/year as described by `config`
///
/// This is the main entry point for a crawl. It will:
/// 1. Resolve the venue adapter
/// 2. Open the corpus database
/// 3. Build the fetcher (HTTP client, limiter, browser pool)
/// 4. Run the crawl and record it in the run ledger
pub async fn crawl(
    config: &Config,
    config_hash: &str,
    venue: &str,
    year: u16,
) -> Result<CrawlReport, HarvestError> {
    let job = CrawlJob::for_venue(venue, year)?;
    let engine = build_engine(config)?;
    let mut corpus = open_corpus(Path::new(&config.output.database_path))?;
    run_recorded(&engine, &job, &mut corpus, config_hash).await
}

/// Crawls several venue/years concurrently as described by `config`
///
/// Unknown venues fail their own slot without affecting the others.
pub async fn crawl_many(
    config: &Config,
    config_hash: &str,
    targets: &[(String, u16)],
) -> Result<Vec<Result<CrawlReport, HarvestError>>, HarvestError> {
    let engine = build_engine(config)?;
    let database_path = PathBuf::from(&config.output.database_path);

    let mut results: Vec<Option<Result<CrawlReport, HarvestError>>> = Vec::new();
    let mut jobs = Vec::new();
    let mut slots = Vec::new();
    for (index, (venue, year)) in targets.iter().enumerate() {
        match CrawlJob::for_venue(venue, *year) {
            Ok(job) => {
                jobs.push(job);
                slots.push(index);
                results.push(None);
            }
            Err(e) => results.push(Some(Err(e))),
        }
    }

    let outcomes = run_jobs(&engine, jobs, &database_path, config_hash).await;
    for (index, outcome) in slots.into_iter().zip(outcomes) {
        results[index] = Some(outcome);
    }

    Ok(results.into_iter().flatten().collect())
}
