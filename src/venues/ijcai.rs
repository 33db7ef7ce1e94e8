//! IJCAI proceedings pages on ijcai.org

use super::extract::{first_text, links, split_authors};
use super::{CarriedMetadata, DetailLink, ListingCursor, ListingEntry, VenueAdapter};
use crate::crawler::FetchedPage;
use crate::record::CandidateRecord;
use crate::HarvestError;
use scraper::Html;

const LISTING_LINKS: &str = r#"[id^="paper"] > div:nth-of-type(3) > a"#;
const TITLE: &str = "#block-system-main > div > div > div:nth-of-type(1) > div:nth-of-type(1) > h1";
const AUTHORS: &str = "#block-system-main > div > div > div:nth-of-type(1) > div:nth-of-type(1) > h2";
const ABSTRACT: &str = "#block-system-main > div > div > div:nth-of-type(3) > div:nth-of-type(1)";

#[derive(Debug, Clone)]
pub struct Ijcai {
    origin: String,
}

impl Ijcai {
    pub fn new() -> Self {
        Self::with_origin("https://www.ijcai.org")
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for Ijcai {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueAdapter for Ijcai {
    fn name(&self) -> &'static str {
        "IJCAI"
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
            url: format!("{}/proceedings/{}", self.origin, year),
        })
    }

    fn parse_listing(&self, _cursor: &ListingCursor, page: &FetchedPage) -> Vec<ListingEntry> {
        let document = Html::parse_document(&page.body);
        // each paper block links both the PDF and the details page
        links(&document, LISTING_LINKS, &page.final_url)
            .into_iter()
            .filter(|url| !url.to_ascii_lowercase().ends_with(".pdf"))
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
