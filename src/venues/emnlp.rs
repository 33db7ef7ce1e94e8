//! EMNLP: ACL Anthology event pages
//!
//! The event page groups papers by volume; volume ids start with a
//! year-dependent prefix (`w18-` for 2018, `d19-` for 2019, the plain year
//! afterwards).

use super::extract::{all_texts, first_text, links};
use super::{CarriedMetadata, DetailLink, ListingCursor, ListingEntry, VenueAdapter};
use crate::crawler::FetchedPage;
use crate::record::CandidateRecord;
use crate::HarvestError;
use scraper::Html;

const TITLE: &str = "#title a";
const AUTHORS: &str = "#main > div:nth-of-type(1) > p > a";
const ABSTRACT: &str =
    "div.acl-abstract > span, #main > div:nth-of-type(2) > div:nth-of-type(1) > div > div > span";

#[derive(Debug, Clone)]
pub struct Emnlp {
    origin: String,
}

impl Emnlp {
    pub fn new() -> Self {
        Self::with_origin("https://aclanthology.org")
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    fn volume_prefix(year: u16) -> String {
        match year {
            2018 => "w18-".to_string(),
            2019 => "d19-".to_string(),
            _ => year.to_string(),
        }
    }
}

impl Default for Emnlp {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueAdapter for Emnlp {
    fn name(&self) -> &'static str {
        "EMNLP"
    }

    fn supported_years(&self) -> Vec<u16> {
        (2018..=2023).collect()
    }

    fn build_seed(&self, year: u16) -> Result<ListingCursor, HarvestError> {
        if !self.supports_year(year) {
            return Err(self.unsupported_year(year));
        }
        Ok(ListingCursor {
            year,
            position: 1,
            url: format!("{}/events/emnlp-{}", self.origin, year),
        })
    }

    fn parse_listing(&self, cursor: &ListingCursor, page: &FetchedPage) -> Vec<ListingEntry> {
        let document = Html::parse_document(&page.body);
        let selector = format!(
            r#"[id^="{}"] > p > span:nth-of-type(2) > strong > a"#,
            Self::volume_prefix(cursor.year)
        );
        links(&document, &selector, &page.final_url)
            .into_iter()
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
            authors: all_texts(&document, AUTHORS),
            abstract_text,
            source_url: page.url.clone(),
        })
    }
}
