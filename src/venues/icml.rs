//! ICML: Proceedings of Machine Learning Research volumes

use super::extract::{first_text, links, split_authors};
use super::{CarriedMetadata, DetailLink, ListingCursor, ListingEntry, VenueAdapter};
use crate::crawler::FetchedPage;
use crate::record::CandidateRecord;
use crate::HarvestError;
use scraper::Html;

/// PMLR volume holding each year's main conference proceedings
const VOLUMES: &[(u16, &str)] = &[
    (2018, "v80"),
    (2019, "v97"),
    (2020, "v119"),
    (2021, "v139"),
    (2022, "v162"),
    (2023, "v202"),
    (2024, "v235"),
];

const LISTING_LINKS: &str = "div.paper > p.links > a:first-of-type";
const TITLE: &str = "article > h1";
const AUTHORS: &str = "article > span.authors, article > span";
const ABSTRACT: &str = "#abstract";

#[derive(Debug, Clone)]
pub struct Icml {
    origin: String,
}

impl Icml {
    pub fn new() -> Self {
        Self::with_origin("https://proceedings.mlr.press")
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    fn volume(year: u16) -> Option<&'static str> {
        VOLUMES
            .iter()
            .find(|(y, _)| *y == year)
            .map(|(_, volume)| *volume)
    }
}

impl Default for Icml {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueAdapter for Icml {
    fn name(&self) -> &'static str {
        "ICML"
    }

    fn supported_years(&self) -> Vec<u16> {
        VOLUMES.iter().map(|(year, _)| *year).collect()
    }

    fn build_seed(&self, year: u16) -> Result<ListingCursor, HarvestError> {
        let volume = Self::volume(year).ok_or_else(|| self.unsupported_year(year))?;
        Ok(ListingCursor {
            year,
            position: 1,
            url: format!("{}/{}/", self.origin, volume),
        })
    }

    fn parse_listing(&self, _cursor: &ListingCursor, page: &FetchedPage) -> Vec<ListingEntry> {
        let document = Html::parse_document(&page.body);
        links(&document, LISTING_LINKS, &page.final_url)
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
            authors: first_text(&document, AUTHORS)
                .map(|line| split_authors(&line))
                .unwrap_or_default(),
            abstract_text,
            source_url: page.url.clone(),
        })
    }
}
