//! Conference schedule sites (ICLR, NeurIPS)
//!
//! Both conferences publish the same schedule application: one page with a
//! `maincard_<id>` card per event, and an event page per id holding the
//! abstract and author buttons. Only cards whose presentation type is on the
//! venue's allow-list are followed.

use super::extract::{all_texts, first_text, nth_child_of_type, own_text, select_all};
use super::{CarriedMetadata, DetailLink, ListingCursor, ListingEntry, VenueAdapter};
use crate::crawler::FetchedPage;
use crate::record::CandidateRecord;
use crate::HarvestError;
use scraper::Html;

const CARDS: &str = r#"div[id^="maincard_"]"#;
const ABSTRACT: &str = "div.abstractContainer";
const AUTHORS: &str = "#main > div:nth-of-type(2) > div > button";

/// A venue served by the shared schedule application
#[derive(Debug, Clone)]
pub struct ScheduleSite {
    name: &'static str,
    origin: String,
    years: Vec<u16>,
    allowed_types: &'static [&'static str],
}

impl ScheduleSite {
    pub fn new(
        name: &'static str,
        origin: impl Into<String>,
        years: Vec<u16>,
        allowed_types: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            origin: origin.into().trim_end_matches('/').to_string(),
            years,
            allowed_types,
        }
    }

    pub fn with_origin(self, origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            ..self
        }
    }

    fn is_allowed(&self, presentation_type: &str) -> bool {
        self.allowed_types.contains(&presentation_type)
    }

    fn event_url(&self, year: u16, event_id: &str) -> String {
        format!(
            "{}/Conferences/{}/Schedule?showEvent={}",
            self.origin, year, event_id
        )
    }
}

impl VenueAdapter for ScheduleSite {
    fn name(&self) -> &'static str {
        self.name
    }

    fn supported_years(&self) -> Vec<u16> {
        self.years.clone()
    }

    fn build_seed(&self, year: u16) -> Result<ListingCursor, HarvestError> {
        if !self.supports_year(year) {
            return Err(self.unsupported_year(year));
        }
        Ok(ListingCursor {
            year,
            position: 1,
            url: format!("{}/Conferences/{}/Schedule", self.origin, year),
        })
    }

    fn parse_listing(&self, cursor: &ListingCursor, page: &FetchedPage) -> Vec<ListingEntry> {
        let document = Html::parse_document(&page.body);
        let mut entries = Vec::new();

        for card in select_all(document.root_element(), CARDS) {
            let Some(event_id) = card
                .value()
                .id()
                .and_then(|id| id.split_once('_'))
                .map(|(_, id)| id.to_string())
                .filter(|id| !id.is_empty())
            else {
                continue;
            };

            let presentation_type = nth_child_of_type(card, "div", 1)
                .map(own_text)
                .unwrap_or_default();
            if !self.is_allowed(&presentation_type) {
                tracing::trace!(%event_id, %presentation_type, "Skipping schedule card");
                continue;
            }

            let title = nth_child_of_type(card, "div", 3)
                .map(own_text)
                .filter(|title| !title.is_empty());

            entries.push(ListingEntry::Detail(DetailLink::carrying(
                self.event_url(cursor.year, &event_id),
                CarriedMetadata {
                    title,
                    authors: Vec::new(),
                },
            )));
        }

        entries
    }

    fn parse_detail(
        &self,
        page: &FetchedPage,
        carried: &CarriedMetadata,
    ) -> Option<CandidateRecord> {
        let document = Html::parse_document(&page.body);
        let abstract_text = first_text(&document, ABSTRACT)?;

        let mut authors = all_texts(&document, AUTHORS);
        if authors.is_empty() {
            authors = carried.authors.clone();
        }

        Some(CandidateRecord {
            title: carried.title.clone().unwrap_or_default(),
            authors,
            abstract_text,
            source_url: page.url.clone(),
        })
    }
}
