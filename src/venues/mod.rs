//! Venue adapters
//!
//! Each supported venue gets one adapter describing how to build the seed
//! listing URL for a year, how to read listing and detail pages, how listing
//! pagination continues, and whether pages need a browser to render. The
//! crawl engine drives every adapter the same way.
//!
//! # Components
//!
//! - `VenueAdapter`: the per-venue rules
//! - `ListingEntry`, `DetailLink`, `CarriedMetadata`: what a listing page yields
//! - `ListingCursor`, `Continuation`, `PaginationMode`: listing pagination
//! - `adapter_for` / `registered`: the venue registry

mod aaai;
mod emnlp;
mod extract;
mod iclr;
mod icml;
mod ieee;
mod ijcai;
mod interspeech;
mod ismir;
mod neurips;
mod schedule;

pub use aaai::Aaai;
pub use emnlp::Emnlp;
pub use iclr::adapter as iclr_site;
pub use icml::Icml;
pub use ieee::Ieee;
pub use ijcai::Ijcai;
pub use interspeech::Interspeech;
pub use ismir::Ismir;
pub use neurips::adapter as neurips_site;
pub use schedule::ScheduleSite;

pub use crate::crawler::{FetchedPage, ReadyCondition, RenderingMode};

use crate::record::CandidateRecord;
use crate::HarvestError;

/// Metadata discovered on a listing page and passed along to the detail step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarriedMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
}

impl CarriedMetadata {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            authors: Vec::new(),
        }
    }
}

/// A detail page to follow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLink {
    pub url: String,
    pub carried: CarriedMetadata,
}

impl DetailLink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            carried: CarriedMetadata::default(),
        }
    }

    pub fn carrying(url: impl Into<String>, carried: CarriedMetadata) -> Self {
        Self {
            url: url.into(),
            carried,
        }
    }
}

/// One item found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEntry {
    /// Follow a detail page to complete the record
    Detail(DetailLink),

    /// The listing page already holds the whole record
    Inline(CandidateRecord),
}

/// Position in a venue's listing sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingCursor {
    pub year: u16,
    /// Page number or session token index, starting at 1
    pub position: u32,
    pub url: String,
}

/// What to do after a listing page has been processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    Next(ListingCursor),
    Done,
}

/// How a venue's listing continues across pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// The whole listing is one page
    None,
    /// Numbered pages
    OffsetPage,
    /// A fixed sequence of opaque session tokens
    SessionToken,
}

/// Per-venue crawling rules
///
/// Implementations are stateless; one adapter value can serve any number of
/// crawls concurrently.
pub trait VenueAdapter: Send + Sync {
    /// Venue name as used in partitions and on the command line
    fn name(&self) -> &'static str;

    fn supported_years(&self) -> Vec<u16>;

    /// Builds the first listing cursor for `year`
    ///
    /// Fails with [`HarvestError::UnsupportedVenueYear`] when the venue has no
    /// entry for that year.
    fn build_seed(&self, year: u16) -> Result<ListingCursor, HarvestError>;

    /// Extracts the entries of a listing page, already type-filtered
    ///
    /// An empty result means there is nothing (more) to crawl.
    fn parse_listing(&self, cursor: &ListingCursor, page: &FetchedPage) -> Vec<ListingEntry>;

    /// Extracts a candidate record from a detail page
    ///
    /// Returns `None` when the abstract cannot be located.
    fn parse_detail(&self, page: &FetchedPage, carried: &CarriedMetadata)
        -> Option<CandidateRecord>;

    fn next_page(&self, _cursor: &ListingCursor) -> Continuation {
        Continuation::Done
    }

    fn pagination(&self, _year: u16) -> PaginationMode {
        PaginationMode::None
    }

    fn listing_render(&self, _year: u16) -> RenderingMode {
        RenderingMode::Static
    }

    fn detail_render(&self, _year: u16) -> RenderingMode {
        RenderingMode::Static
    }

    fn supports_year(&self, year: u16) -> bool {
        self.supported_years().contains(&year)
    }

    fn unsupported_year(&self, year: u16) -> HarvestError {
        HarvestError::UnsupportedVenueYear {
            venue: self.name().to_string(),
            year,
        }
    }
}

fn all_adapters() -> Vec<Box<dyn VenueAdapter>> {
    vec![
        Box::new(Aaai::new()),
        Box::new(Emnlp::new()),
        Box::new(iclr_site()),
        Box::new(Icml::new()),
        Box::new(Ieee::new()),
        Box::new(Ijcai::new()),
        Box::new(Interspeech::new()),
        Box::new(Ismir::new()),
        Box::new(neurips_site()),
    ]
}

/// Looks up a venue adapter by name, ignoring case
pub fn adapter_for(name: &str) -> Option<Box<dyn VenueAdapter>> {
    all_adapters()
        .into_iter()
        .find(|adapter| adapter.name().eq_ignore_ascii_case(name.trim()))
}

/// Names of all registered venues
pub fn registered() -> Vec<&'static str> {
    all_adapters().iter().map(|adapter| adapter.name()).collect()
}

/// Registered venues with the years each one supports
pub fn registry_table() -> Vec<(&'static str, Vec<u16>)> {
    all_adapters()
        .iter()
        .map(|adapter| (adapter.name(), adapter.supported_years()))
        .collect()
}
