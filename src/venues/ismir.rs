//! ISMIR conference programs
//!
//! 2022 and 2023 publish a scripted program site: the paper list is split
//! into keyword sessions and both list and paper pages need a browser. The
//! 2021 site is a single static page holding every title, author list and
//! abstract, so it yields inline records without any detail fetches.

use super::extract::{first_text, nth_child_of_type, own_text, resolve_link, select_all, text_of};
use super::{
    CarriedMetadata, Continuation, DetailLink, ListingCursor, ListingEntry, PaginationMode,
    RenderingMode, VenueAdapter,
};
use crate::crawler::FetchedPage;
use crate::record::CandidateRecord;
use crate::HarvestError;
use scraper::Html;
use url::Url;

/// Number of keyword sessions on the program sites
pub const SESSION_COUNT: u32 = 16;

const CARD_LINKS: &str = "div.cards.row.papers-cards > div > a";
const CARD_TITLE: &str = "div > div > h5";
const LISTING_READY: &str = "body > div.container > div.content > div.cards.row.papers-cards > div > a";
const DETAIL_READY: &str = "body > div:nth-of-type(1) > div:nth-of-type(2) > div:nth-of-type(3) > div:nth-of-type(1) > div > div > div";
const AUTHORS: &str = "body > div:nth-of-type(1) > div:nth-of-type(2) > div:nth-of-type(1) > div > h3 > a";
const ABSTRACT: &str = "#abstractExample > p:first-of-type";

const PAPER_BLOCKS: &str = r#"div[class^="paper"]"#;
const PAPER_AUTHORS: &str = "span.paper_author";

#[derive(Debug, Clone, Default)]
pub struct Ismir {
    /// Replaces every per-year host when set
    origin: Option<String>,
}

impl Ismir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into().trim_end_matches('/').to_string()),
        }
    }

    fn has_sessions(year: u16) -> bool {
        matches!(year, 2022 | 2023)
    }

    fn host(&self, year: u16) -> String {
        match &self.origin {
            Some(origin) => origin.clone(),
            None if Self::has_sessions(year) => format!("https://ismir{}program.ismir.net", year),
            None => format!("https://ismir{}.ismir.net", year),
        }
    }

    fn session_url(&self, year: u16, session: u32) -> String {
        format!(
            "{}/papers.html?filter=keywords&session={}",
            self.host(year),
            session
        )
    }

    fn parse_cards(&self, page: &FetchedPage) -> Vec<ListingEntry> {
        let Ok(base) = Url::parse(&page.final_url) else {
            return Vec::new();
        };
        let document = Html::parse_document(&page.body);

        select_all(document.root_element(), CARD_LINKS)
            .into_iter()
            .filter_map(|card| {
                let url = resolve_link(card.value().attr("href")?, &base)?;
                let carried = select_all(card, CARD_TITLE)
                    .into_iter()
                    .next()
                    .map(text_of)
                    .map(|heading| strip_paper_id(&heading))
                    .filter(|title| !title.is_empty())
                    .map(CarriedMetadata::with_title)
                    .unwrap_or_default();
                Some(ListingEntry::Detail(DetailLink::carrying(url, carried)))
            })
            .collect()
    }

    /// Inline records from the single-page 2021 listing
    ///
    /// Only blocks with a title count; the n-th titled block owns the
    /// abstract container `#paper_abstract_{n}`.
    fn parse_inline(&self, page: &FetchedPage) -> Vec<ListingEntry> {
        let document = Html::parse_document(&page.body);
        let mut entries = Vec::new();

        for block in select_all(document.root_element(), PAPER_BLOCKS) {
            let Some(title) = nth_child_of_type(block, "div", 1)
                .map(own_text)
                .filter(|title| !title.is_empty())
            else {
                continue;
            };
            let index = entries.len() + 1;

            let authors = nth_child_of_type(block, "div", 2)
                .map(|line| {
                    select_all(line, PAPER_AUTHORS)
                        .into_iter()
                        .map(text_of)
                        .filter(|name| !name.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            let abstract_id = format!("paper_abstract_{}", index);
            let abstract_text =
                first_text(&document, &format!("#{} > p", abstract_id)).unwrap_or_default();

            entries.push(ListingEntry::Inline(CandidateRecord {
                title,
                authors,
                abstract_text,
                source_url: format!("{}#{}", page.url, abstract_id),
            }));
        }

        entries
    }
}

/// Drops the `"<id>:"` prefix the program site puts before each title
fn strip_paper_id(heading: &str) -> String {
    match heading.split_once(':') {
        Some((_, title)) => title.trim().to_string(),
        None => heading.trim().to_string(),
    }
}

impl VenueAdapter for Ismir {
    fn name(&self) -> &'static str {
        "ISMIR"
    }

    fn supported_years(&self) -> Vec<u16> {
        vec![2021, 2022, 2023]
    }

    fn build_seed(&self, year: u16) -> Result<ListingCursor, HarvestError> {
        if !self.supports_year(year) {
            return Err(self.unsupported_year(year));
        }
        let url = if Self::has_sessions(year) {
            self.session_url(year, 1)
        } else {
            format!("{}/papers", self.host(year))
        };
        Ok(ListingCursor {
            year,
            position: 1,
            url,
        })
    }

    fn parse_listing(&self, cursor: &ListingCursor, page: &FetchedPage) -> Vec<ListingEntry> {
        if Self::has_sessions(cursor.year) {
            self.parse_cards(page)
        } else {
            self.parse_inline(page)
        }
    }

    fn parse_detail(
        &self,
        page: &FetchedPage,
        carried: &CarriedMetadata,
    ) -> Option<CandidateRecord> {
        let document = Html::parse_document(&page.body);
        let abstract_text = first_text(&document, ABSTRACT)?;

        let authors: Vec<String> = select_all(document.root_element(), AUTHORS)
            .into_iter()
            .map(text_of)
            .filter(|name| !name.is_empty())
            .collect();

        Some(CandidateRecord {
            title: carried.title.clone().unwrap_or_default(),
            authors: if authors.is_empty() {
                carried.authors.clone()
            } else {
                authors
            },
            abstract_text,
            source_url: page.url.clone(),
        })
    }

    fn next_page(&self, cursor: &ListingCursor) -> Continuation {
        if !Self::has_sessions(cursor.year) || cursor.position >= SESSION_COUNT {
            return Continuation::Done;
        }
        let position = cursor.position + 1;
        Continuation::Next(ListingCursor {
            year: cursor.year,
            position,
            url: self.session_url(cursor.year, position),
        })
    }

    fn pagination(&self, year: u16) -> PaginationMode {
        if Self::has_sessions(year) {
            PaginationMode::SessionToken
        } else {
            PaginationMode::None
        }
    }

    fn listing_render(&self, year: u16) -> RenderingMode {
        if Self::has_sessions(year) {
            RenderingMode::browser(LISTING_READY)
        } else {
            RenderingMode::Static
        }
    }

    fn detail_render(&self, year: u16) -> RenderingMode {
        if Self::has_sessions(year) {
            RenderingMode::browser(DETAIL_READY)
        } else {
            RenderingMode::Static
        }
    }
}
