/// Crawl state definitions for one venue/year crawl
///
/// The engine moves through these states in a fixed order. Every transition
/// is checked with [`CrawlState::can_transition_to`] before it is applied.
use std::fmt;

/// Represents where a venue/year crawl currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    // ===== Active States =====
    /// Crawl context created, seed not yet built
    Init,

    /// A listing page is being fetched
    FetchingListing,

    /// Entries are being extracted from the fetched listing page
    ExtractingLinks,

    /// Detail pages for the current listing page are in flight
    DispatchingDetails,

    /// All details of the current page settled; deciding whether to continue
    AwaitingNextPage,

    // ===== Terminal States =====
    /// The crawl ran to completion (possibly with zero records)
    Terminated,

    /// The crawl could not start
    Failed,
}

impl CrawlState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::Failed)
    }

    /// Returns true if this is an active state
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;
        matches!(
            (self, next),
            (Init, FetchingListing)
                | (Init, Failed)
                | (FetchingListing, ExtractingLinks)
                | (FetchingListing, Terminated)
                | (ExtractingLinks, DispatchingDetails)
                | (ExtractingLinks, Terminated)
                | (DispatchingDetails, AwaitingNextPage)
                | (AwaitingNextPage, FetchingListing)
                | (AwaitingNextPage, Terminated)
        )
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::FetchingListing => "fetching_listing",
            Self::ExtractingLinks => "extracting_links",
            Self::DispatchingDetails => "dispatching_details",
            Self::AwaitingNextPage => "awaiting_next_page",
            Self::Terminated => "terminated",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
