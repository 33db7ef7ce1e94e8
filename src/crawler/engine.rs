//! Crawl engine: drives one venue/year crawl through its states
//!
//! Listing pages are fetched one after another. The detail pages linked from
//! a listing page are fetched concurrently, bounded by the configured detail
//! concurrency, and every result is validated and appended on its own so one
//! bad page never affects its siblings.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchRequest, PageFetcher, RenderingMode};
use crate::crawler::visited::{Visit, VisitedSet};
use crate::record::{CandidateRecord, PaperRecord, Partition};
use crate::state::CrawlState;
use crate::storage::{CorpusSink, RunCounts};
use crate::venues::{
    CarriedMetadata, Continuation, DetailLink, ListingCursor, ListingEntry, VenueAdapter,
};
use crate::HarvestError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;

/// Engine knobs taken from the `[crawler]` config section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub detail_concurrency: usize,
    pub max_listing_pages: u32,
}

impl EngineSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            detail_concurrency: config.detail_concurrency.max(1) as usize,
            max_listing_pages: config.max_listing_pages.max(1),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            detail_concurrency: 4,
            max_listing_pages: 200,
        }
    }
}

/// Which level of a venue site a task fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Listing,
    Detail,
}

/// One page fetch scheduled by the engine
///
/// Detail tasks carry what the listing page already knew about the paper,
/// for sites that split title and abstract across the two levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: String,
    pub kind: TaskKind,
    pub carried: CarriedMetadata,
}

impl CrawlTask {
    pub fn listing(cursor: &ListingCursor) -> Self {
        Self {
            url: cursor.url.clone(),
            kind: TaskKind::Listing,
            carried: CarriedMetadata::default(),
        }
    }

    pub fn detail(link: DetailLink) -> Self {
        Self {
            url: link.url,
            kind: TaskKind::Detail,
            carried: link.carried,
        }
    }

    fn request(&self, render: RenderingMode) -> FetchRequest {
        FetchRequest::new(self.url.clone(), render)
    }
}

/// Outcome of one venue/year crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub partition: Partition,
    pub state: CrawlState,
    pub listing_pages: u32,
    pub details_dispatched: u64,
    pub duplicates_skipped: u64,
    /// Records newly written to the sink
    pub records_emitted: u64,
    /// Valid records the sink already held from an earlier run
    pub records_existing: u64,
    pub records_dropped: u64,
    pub fetch_failures: u64,
}

impl CrawlReport {
    fn new(partition: Partition) -> Self {
        Self {
            partition,
            state: CrawlState::Init,
            listing_pages: 0,
            details_dispatched: 0,
            duplicates_skipped: 0,
            records_emitted: 0,
            records_existing: 0,
            records_dropped: 0,
            fetch_failures: 0,
        }
    }

    /// Counters stored in the run ledger
    pub fn counts(&self) -> RunCounts {
        RunCounts {
            records_emitted: self.records_emitted,
            records_dropped: self.records_dropped,
            fetch_failures: self.fetch_failures,
        }
    }
}

/// Per-crawl mutable state
///
/// Created for one crawl and dropped with it; nothing here is shared with
/// other crawls running in the same process.
struct CrawlContext {
    visited: VisitedSet,
    fetched_listings: HashSet<String>,
    report: CrawlReport,
}

impl CrawlContext {
    fn new(partition: Partition) -> Self {
        Self {
            visited: VisitedSet::new(),
            fetched_listings: HashSet::new(),
            report: CrawlReport::new(partition),
        }
    }

    fn state(&self) -> CrawlState {
        self.report.state
    }

    fn transition(&mut self, next: CrawlState) -> Result<(), HarvestError> {
        let from = self.report.state;
        if !from.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition { from, to: next });
        }
        tracing::trace!(partition = %self.report.partition, %from, to = %next, "Crawl state change");
        self.report.state = next;
        Ok(())
    }

    /// Validates a candidate and hands it to the sink
    fn accept(
        &mut self,
        candidate: CandidateRecord,
        sink: &mut dyn CorpusSink,
    ) -> Result<(), HarvestError> {
        let source_url = candidate.source_url.clone();
        let Some(record) = PaperRecord::from_candidate(candidate, &self.report.partition) else {
            tracing::debug!(url = %source_url, "Dropping record with a missing field");
            self.report.records_dropped += 1;
            return Ok(());
        };

        if sink.append(&record)? {
            self.report.records_emitted += 1;
        } else {
            self.report.records_existing += 1;
        }
        Ok(())
    }
}

/// Runs venue/year crawls against a page fetcher
///
/// The engine itself holds no crawl state, so one engine can run many
/// crawls, one after another or concurrently.
pub struct CrawlEngine<F> {
    fetcher: F,
    settings: EngineSettings,
}

impl<F: PageFetcher> CrawlEngine<F> {
    pub fn new(fetcher: F, settings: EngineSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    /// Crawls one venue/year to completion
    ///
    /// Fails only when the crawl cannot start (no seed for the year) or the
    /// sink cannot be written. Fetch and parse failures are counted in the
    /// report instead.
    pub async fn run(
        &self,
        adapter: &dyn VenueAdapter,
        year: u16,
        sink: &mut dyn CorpusSink,
    ) -> Result<CrawlReport, HarvestError> {
        let mut ctx = CrawlContext::new(Partition::new(adapter.name(), year));

        let mut cursor = match adapter.build_seed(year) {
            Ok(seed) => seed,
            Err(e) => {
                ctx.transition(CrawlState::Failed)?;
                tracing::error!(venue = adapter.name(), year, error = %e, "Cannot start crawl");
                return Err(e);
            }
        };

        tracing::info!(
            partition = %ctx.report.partition,
            seed = %cursor.url,
            pagination = ?adapter.pagination(year),
            "Starting crawl"
        );
        ctx.transition(CrawlState::FetchingListing)?;

        while ctx.state().is_active() {
            match ctx.state() {
                CrawlState::FetchingListing => {
                    self.process_listing(adapter, &cursor, &mut ctx, sink).await?;
                }
                CrawlState::AwaitingNextPage => {
                    match self.advance(adapter, &cursor, &mut ctx)? {
                        Some(next) => cursor = next,
                        None => break,
                    }
                }
                state => {
                    // process_listing always leaves the crawl in one of the
                    // states handled above
                    tracing::error!(%state, "Crawl stalled in an intermediate state");
                    break;
                }
            }
        }

        let report = ctx.report;
        tracing::info!(
            partition = %report.partition,
            listing_pages = report.listing_pages,
            details = report.details_dispatched,
            emitted = report.records_emitted,
            existing = report.records_existing,
            dropped = report.records_dropped,
            failures = report.fetch_failures,
            "Crawl finished"
        );
        Ok(report)
    }

    /// FetchingListing → ExtractingLinks → DispatchingDetails → AwaitingNextPage
    ///
    /// Ends in Terminated instead when the listing page cannot be fetched or
    /// yields nothing.
    async fn process_listing(
        &self,
        adapter: &dyn VenueAdapter,
        cursor: &ListingCursor,
        ctx: &mut CrawlContext,
        sink: &mut dyn CorpusSink,
    ) -> Result<(), HarvestError> {
        let task = CrawlTask::listing(cursor);
        ctx.fetched_listings.insert(task.url.clone());
        let request = task.request(adapter.listing_render(cursor.year));

        let page = match self.fetcher.fetch(&request).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    partition = %ctx.report.partition,
                    position = cursor.position,
                    error = %e,
                    "Listing page failed, ending crawl"
                );
                ctx.report.fetch_failures += 1;
                return ctx.transition(CrawlState::Terminated);
            }
        };
        ctx.report.listing_pages += 1;

        ctx.transition(CrawlState::ExtractingLinks)?;
        let entries = adapter.parse_listing(cursor, &page);
        if entries.is_empty() {
            tracing::info!(
                partition = %ctx.report.partition,
                position = cursor.position,
                "Listing page has no entries"
            );
            return ctx.transition(CrawlState::Terminated);
        }
        tracing::debug!(
            partition = %ctx.report.partition,
            position = cursor.position,
            entries = entries.len(),
            "Extracted listing entries"
        );

        ctx.transition(CrawlState::DispatchingDetails)?;
        self.dispatch(adapter, cursor.year, entries, ctx, sink).await?;
        ctx.transition(CrawlState::AwaitingNextPage)
    }

    /// Records inline entries and fetches detail pages for the rest
    async fn dispatch(
        &self,
        adapter: &dyn VenueAdapter,
        year: u16,
        entries: Vec<ListingEntry>,
        ctx: &mut CrawlContext,
        sink: &mut dyn CorpusSink,
    ) -> Result<(), HarvestError> {
        let mut tasks: Vec<CrawlTask> = Vec::new();

        for entry in entries {
            match entry {
                ListingEntry::Inline(candidate) => {
                    if !ctx.visited.insert_key(&candidate.source_url) {
                        ctx.report.duplicates_skipped += 1;
                        continue;
                    }
                    ctx.accept(candidate, sink)?;
                }
                ListingEntry::Detail(link) => match ctx.visited.insert_url(&link.url) {
                    Visit::New(_) => tasks.push(CrawlTask::detail(link)),
                    Visit::Seen => {
                        tracing::trace!(url = %link.url, "Skipping visited link");
                        ctx.report.duplicates_skipped += 1;
                    }
                    Visit::Invalid => {
                        tracing::debug!(url = %link.url, "Dropping unusable detail link");
                        ctx.report.records_dropped += 1;
                    }
                },
            }
        }

        if tasks.is_empty() {
            return Ok(());
        }
        ctx.report.details_dispatched += tasks.len() as u64;

        let render = adapter.detail_render(year);
        let fetcher = &self.fetcher;
        let mut results = stream::iter(tasks)
            .map(|task| {
                let request = task.request(render.clone());
                async move {
                    let outcome = fetcher.fetch(&request).await;
                    (task, outcome)
                }
            })
            .buffer_unordered(self.settings.detail_concurrency.max(1));

        while let Some((task, outcome)) = results.next().await {
            match outcome {
                Ok(page) => match adapter.parse_detail(&page, &task.carried) {
                    Some(candidate) => ctx.accept(candidate, sink)?,
                    None => {
                        tracing::debug!(url = %task.url, "No abstract on detail page");
                        ctx.report.records_dropped += 1;
                    }
                },
                Err(e) => {
                    tracing::warn!(url = %task.url, error = %e, "Dropping detail page");
                    ctx.report.fetch_failures += 1;
                }
            }
        }

        Ok(())
    }

    /// AwaitingNextPage → FetchingListing (returning the next cursor) or Terminated
    fn advance(
        &self,
        adapter: &dyn VenueAdapter,
        cursor: &ListingCursor,
        ctx: &mut CrawlContext,
    ) -> Result<Option<ListingCursor>, HarvestError> {
        let next = match adapter.next_page(cursor) {
            Continuation::Next(next) => next,
            Continuation::Done => {
                ctx.transition(CrawlState::Terminated)?;
                return Ok(None);
            }
        };

        if ctx.report.listing_pages >= self.settings.max_listing_pages {
            tracing::warn!(
                partition = %ctx.report.partition,
                max_listing_pages = self.settings.max_listing_pages,
                "Listing page limit reached"
            );
            ctx.transition(CrawlState::Terminated)?;
            return Ok(None);
        }

        if ctx.fetched_listings.contains(&next.url) {
            tracing::warn!(url = %next.url, "Listing page already fetched, ending crawl");
            ctx.transition(CrawlState::Terminated)?;
            return Ok(None);
        }

        ctx.transition(CrawlState::FetchingListing)?;
        Ok(Some(next))
    }
}
