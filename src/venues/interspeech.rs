//! Interspeech papers in the ISCA archive

use super::extract::{first_text, links, split_authors};
use super::{CarriedMetadata, DetailLink, ListingCursor, ListingEntry, VenueAdapter};
use crate::crawler::FetchedPage;
use crate::record::CandidateRecord;
use crate::HarvestError;
use scraper::Html;
use std::collections::HashSet;

const LISTING_LINKS: &str = "div a[href]";
const TITLE: &str = "#global-info > h3";
const AUTHORS: &str = "#global-info > h5";
const ABSTRACT: &str = "#abstract > p";

#[derive(Debug, Clone)]
pub struct Interspeech {
    origin: String,
}

impl Interspeech {
    pub fn new() -> Self {
        Self::with_origin("https://www.isca-archive.org")
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for Interspeech {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueAdapter for Interspeech {
    fn name(&self) -> &'static str {
        "Interspeech"
    }

    fn supported_years(&self) -> Vec<u16> {
        (2018..=2024).collect()
    }

    fn build_seed(&self, year: u16) -> Result<ListingCursor, HarvestError> {
        if !self.supports_year(year) {
            return Err(self.unsupported_year(year));
        }
        Ok(ListingCursor {
            year,
            position: 1,
            url: format!("{}/interspeech_{}/index.html", self.origin, year),
        })
    }

    /// Every `.html` paper link on the index page, skipping archive indexes
    ///
    /// The index links a paper more than once (title and PDF row), so links
    /// are collapsed here before the engine sees them.
    fn parse_listing(&self, _cursor: &ListingCursor, page: &FetchedPage) -> Vec<ListingEntry> {
        let document = Html::parse_document(&page.body);
        let mut seen = HashSet::new();

        links(&document, LISTING_LINKS, &page.final_url)
            .into_iter()
            .filter(|url| url.ends_with(".html"))
            .filter(|url| !url.ends_with("/index.html"))
            .filter(|url| seen.insert(url.clone()))
            .map(|url| ListingEntry::Detail(DetailLink::new(url)))
            .collect()
    }

    fn parse_detail(
        &self,
        page: &FetchedPage,
        carried: &CarriedMetadata,
    ) -> Option<CandidateRecord> {
        let document = Html::parse_document(&page.body);
        let abstract_text = first_text(&document, ABSTRACT)?;

        Some(CandidateRecord {
            title: first_text(&document, TITLE)
                .or_else(|| carried.title.clone())
                .unwrap_or_default(),
            authors: first_text(&document, AUTHORS)
                .map(|line| split_authors(&line))
                .unwrap_or_default(),
            abstract_text,
            source_url: page.url.clone(),
        })
    }
}
