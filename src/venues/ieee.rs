//! ICRA proceedings on IEEE Xplore
//!
//! Xplore renders everything client-side, so both the issue listing and the
//! document pages go through the browser. The listing is paged 100 results
//! at a time; paging stops at the first page with no results.

use super::extract::{all_texts, own_text, resolve_link, select_all, select_first, text_of};
use super::{
    CarriedMetadata, Continuation, DetailLink, ListingCursor, ListingEntry, PaginationMode,
    RenderingMode, VenueAdapter,
};
use crate::crawler::FetchedPage;
use crate::record::CandidateRecord;
use crate::HarvestError;
use scraper::Html;
use url::Url;

/// Xplore `conhome` and `isnumber` identifiers for each ICRA year
const PROCEEDINGS: &[(u16, &str, &str)] = &[
    (2018, "8449910", "8460178"),
    (2019, "8780387", "8793254"),
    (2020, "9187508", "9196508"),
    (2021, "9560720", "9560666"),
    (2022, "9811522", "9811357"),
    (2023, "10160211", "10160212"),
    (2024, "10609961", "10609862"),
];

const RESULT_LINKS: &str = "xpl-issue-results-items > div > div:nth-of-type(2) > h2 > a";
const LISTING_READY: &str =
    "xpl-issue-results-items > div:nth-of-type(1) > div:nth-of-type(1) > div:nth-of-type(2) > h2 > a";
const ABSTRACT: &str = "xpl-document-abstract > section > div:nth-of-type(2) > div:nth-of-type(1) > div > div > div";
const AUTHORS: &str = "div.authors-info-container span.authors-info a > span";

#[derive(Debug, Clone)]
pub struct Ieee {
    origin: String,
}

impl Ieee {
    pub fn new() -> Self {
        Self::with_origin("https://ieeexplore.ieee.org")
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    fn listing_url(&self, year: u16, page_number: u32) -> Option<String> {
        let (_, conhome, isnumber) = PROCEEDINGS.iter().find(|(y, _, _)| *y == year)?;
        Some(format!(
            "{}/xpl/conhome/{}/proceeding?isnumber={}&sortType=vol-only-seq&rowsPerPage=100&pageNumber={}",
            self.origin, conhome, isnumber, page_number
        ))
    }
}

impl Default for Ieee {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueAdapter for Ieee {
    fn name(&self) -> &'static str {
        "ICRA"
    }

    fn supported_years(&self) -> Vec<u16> {
        PROCEEDINGS.iter().map(|(year, _, _)| *year).collect()
    }

    fn build_seed(&self, year: u16) -> Result<ListingCursor, HarvestError> {
        let url = self
            .listing_url(year, 1)
            .ok_or_else(|| self.unsupported_year(year))?;
        Ok(ListingCursor {
            year,
            position: 1,
            url,
        })
    }

    fn parse_listing(&self, _cursor: &ListingCursor, page: &FetchedPage) -> Vec<ListingEntry> {
        let Ok(base) = Url::parse(&page.final_url) else {
            return Vec::new();
        };
        let document = Html::parse_document(&page.body);

        select_all(document.root_element(), RESULT_LINKS)
            .into_iter()
            .filter_map(|anchor| {
                let url = resolve_link(anchor.value().attr("href")?, &base)?;
                let title = text_of(anchor);
                let carried = if title.is_empty() {
                    CarriedMetadata::default()
                } else {
                    CarriedMetadata::with_title(title)
                };
                Some(ListingEntry::Detail(DetailLink::carrying(url, carried)))
            })
            .collect()
    }

    fn parse_detail(
        &self,
        page: &FetchedPage,
        carried: &CarriedMetadata,
    ) -> Option<CandidateRecord> {
        let document = Html::parse_document(&page.body);
        let abstract_text = select_first(&document, ABSTRACT)
            .map(own_text)
            .filter(|text| !text.is_empty())?;

        Some(CandidateRecord {
            title: carried.title.clone().unwrap_or_default(),
            authors: all_texts(&document, AUTHORS),
            abstract_text,
            source_url: page.url.clone(),
        })
    }

    fn next_page(&self, cursor: &ListingCursor) -> Continuation {
        let position = cursor.position + 1;
        match self.listing_url(cursor.year, position) {
            Some(url) => Continuation::Next(ListingCursor {
                year: cursor.year,
                position,
                url,
            }),
            None => Continuation::Done,
        }
    }

    fn pagination(&self, _year: u16) -> PaginationMode {
        PaginationMode::OffsetPage
    }

    fn listing_render(&self, _year: u16) -> RenderingMode {
        RenderingMode::browser(LISTING_READY)
    }

    fn detail_render(&self, _year: u16) -> RenderingMode {
        RenderingMode::BrowserRendered { ready: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(href: &str, title: &str) -> String {
        format!(
            r#"<div class="List-results-items">
  <div class="checkbox"></div>
  <div class="col result-item-align"><h2><a href="{href}">{title}</a></h2><p class="author">x</p></div>
</div>"#
        )
    }

    #[test]
    fn test_seed_and_pagination() {
        let adapter = Ieee::new();
        let seed = adapter.build_seed(2023).unwrap();
        assert_eq!(
            seed.url,
            "https://ieeexplore.ieee.org/xpl/conhome/10160211/proceeding?isnumber=10160212&sortType=vol-only-seq&rowsPerPage=100&pageNumber=1"
        );

        let Continuation::Next(next) = adapter.next_page(&seed) else {
            panic!("expected another page");
        };
        assert_eq!(next.position, 2);
        assert!(next.url.ends_with("pageNumber=2"));
        assert_eq!(adapter.pagination(2023), PaginationMode::OffsetPage);
    }

    #[test]
    fn test_pages_are_browser_rendered() {
        let adapter = Ieee::new();
        assert_eq!(
            adapter.listing_render(2023),
            RenderingMode::browser(LISTING_READY)
        );
        assert_eq!(
            adapter.detail_render(2023),
            RenderingMode::BrowserRendered { ready: None }
        );
    }

    #[test]
    fn test_listing_carries_titles() {
        let adapter = Ieee::new();
        let cursor = adapter.build_seed(2022).unwrap();
        let body = format!(
            "<html><body><xpl-issue-results-items>{}{}</xpl-issue-results-items></body></html>",
            result("/document/9811001/", "Legged Robots"),
            result("/document/9811002/", "Soft  Grippers"),
        );

        let entries = adapter.parse_listing(&cursor, &FetchedPage::new(&cursor.url, body));
        assert_eq!(
            entries,
            vec![
                ListingEntry::Detail(DetailLink::carrying(
                    "https://ieeexplore.ieee.org/document/9811001/",
                    CarriedMetadata::with_title("Legged Robots"),
                )),
                ListingEntry::Detail(DetailLink::carrying(
                    "https://ieeexplore.ieee.org/document/9811002/",
                    CarriedMetadata::with_title("Soft Grippers"),
                )),
            ]
        );
    }

    #[test]
    fn test_empty_results_page() {
        let adapter = Ieee::new();
        let cursor = adapter.build_seed(2022).unwrap();
        let body = "<html><body><xpl-issue-results-items></xpl-issue-results-items></body></html>";
        assert!(adapter
            .parse_listing(&cursor, &FetchedPage::new(&cursor.url, body))
            .is_empty());
    }

    #[test]
    fn test_detail_fields() {
        let body = r#"<html><body>
<div class="authors-info-container">
  <span class="authors-info"><span><a href="/author/1"><span>Ada Lovelace</span></a></span></span>
  <span class="authors-info"><span><a href="/author/2"><span>Alan Turing</span></a></span></span>
</div>
<xpl-document-abstract><section>
  <div class="header">Abstract</div>
  <div class="body"><div class="abstract-text"><div><div><div>Robots walk.<span>Show more</span></div></div></div></div></div>
</section></xpl-document-abstract>
</body></html>"#;

        let record = Ieee::new()
            .parse_detail(
                &FetchedPage::new("https://ieeexplore.ieee.org/document/9811001/", body),
                &CarriedMetadata::with_title("Legged Robots"),
            )
            .unwrap();

        assert_eq!(record.title, "Legged Robots");
        assert_eq!(record.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(record.abstract_text, "Robots walk.");
    }
}
