//! AAAI: dblp table of contents, detail pages on the AAAI OJS site
//!
//! dblp lists every paper of a year on one page; each entry's first link
//! points (usually through a DOI redirect) at the OJS article page.

use super::extract::{first_text, links, own_text, select_all, select_first, text_of};
use super::{CarriedMetadata, DetailLink, ListingCursor, ListingEntry, VenueAdapter};
use crate::crawler::FetchedPage;
use crate::record::CandidateRecord;
use crate::HarvestError;
use scraper::Html;

const LISTING_LINKS: &str = "nav > ul > li > div > a:first-of-type";
const TITLE: &str = "article > h1";
const AUTHORS: &str =
    "article > div > div:nth-of-type(1) > section:nth-of-type(1) > ul > li > span:first-of-type";
const ABSTRACT_SECTION: &str = r#"section[class*="abstract"]"#;

#[derive(Debug, Clone)]
pub struct Aaai {
    origin: String,
}

impl Aaai {
    pub fn new() -> Self {
        Self::with_origin("https://dblp.org")
    }

    /// Points the adapter at another host serving the same page layout
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for Aaai {
    fn default() -> Self {
        Self::new()
    }
}

impl VenueAdapter for Aaai {
    fn name(&self) -> &'static str {
        "AAAI"
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
            url: format!("{}/db/conf/aaai/aaai{}.html", self.origin, year),
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
        let abstract_text = extract_abstract(&document)?;

        let title = first_text(&document, TITLE)
            .or_else(|| carried.title.clone())
            .unwrap_or_default();
        let authors = select_all(document.root_element(), AUTHORS)
            .into_iter()
            .map(text_of)
            .collect();

        Some(CandidateRecord {
            title,
            authors,
            abstract_text,
            source_url: page.url.clone(),
        })
    }
}

/// Paragraph after the abstract heading, else the section's loose text
fn extract_abstract(document: &Html) -> Option<String> {
    let section = select_first(document, ABSTRACT_SECTION)?;

    let from_paragraph = select_all(section, "p")
        .into_iter()
        .map(text_of)
        .find(|text| !text.is_empty());

    from_paragraph
        .or_else(|| Some(own_text(section)))
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, body: &str) -> FetchedPage {
        FetchedPage {
            url: url.to_string(),
            final_url: url.to_string(),
            body: body.to_string(),
        }
    }

    const LISTING: &str = r#"
<html><body>
  <ul class="publ-list">
    <li class="entry"><nav class="publ"><ul>
      <li class="drop-down"><div class="head"><a href="https://doi.org/10.1609/aaai.v38i1.1">ee</a><a href="https://example.org/alt">alt</a></div></li>
    </ul></nav></li>
    <li class="entry"><nav class="publ"><ul>
      <li class="drop-down"><div class="head"><a href="https://doi.org/10.1609/aaai.v38i1.2">ee</a></div></li>
    </ul></nav></li>
  </ul>
</body></html>"#;

    const DETAIL: &str = r#"
<html><body><div><div><div><div>
<article class="obj_article_details">
  <h1 class="page_title"> Learning to Plan </h1>
  <div class="row"><div class="main_entry">
    <section class="item authors"><ul class="authors">
      <li><span class="name">Ada Lovelace</span><span class="affiliation">Analytical Engines</span></li>
      <li><span class="name">Alan Turing</span></li>
    </ul></section>
    <section class="item abstract">
      <h2 class="label">Abstract</h2>
      <p>We plan.  Then we learn.</p>
    </section>
  </div></div>
</article>
</div></div></div></div></body></html>"#;

    #[test]
    fn test_seed_uses_dblp_year_page() {
        let seed = Aaai::new().build_seed(2024).unwrap();
        assert_eq!(seed.url, "https://dblp.org/db/conf/aaai/aaai2024.html");
    }

    #[test]
    fn test_listing_takes_first_link_per_entry() {
        let adapter = Aaai::new();
        let cursor = adapter.build_seed(2024).unwrap();
        let entries = adapter.parse_listing(&cursor, &page(&cursor.url, LISTING));

        assert_eq!(
            entries,
            vec![
                ListingEntry::Detail(DetailLink::new("https://doi.org/10.1609/aaai.v38i1.1")),
                ListingEntry::Detail(DetailLink::new("https://doi.org/10.1609/aaai.v38i1.2")),
            ]
        );
    }

    #[test]
    fn test_detail_fields() {
        let record = Aaai::new()
            .parse_detail(
                &page("https://doi.org/10.1609/aaai.v38i1.1", DETAIL),
                &CarriedMetadata::default(),
            )
            .unwrap();

        assert_eq!(record.title, "Learning to Plan");
        assert_eq!(record.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(record.abstract_text, "We plan. Then we learn.");
        assert_eq!(record.source_url, "https://doi.org/10.1609/aaai.v38i1.1");
    }

    #[test]
    fn test_abstract_without_paragraph() {
        let body = r#"<section class="item abstract"><h2>Abstract</h2> Loose abstract text. </section>"#;
        let record = Aaai::new()
            .parse_detail(&page("https://x.org/1", body), &CarriedMetadata::default())
            .unwrap();
        assert_eq!(record.abstract_text, "Loose abstract text.");
    }

    #[test]
    fn test_missing_abstract_yields_nothing() {
        let body = "<article><h1>Only a title</h1></article>";
        assert!(Aaai::new()
            .parse_detail(&page("https://x.org/1", body), &CarriedMetadata::default())
            .is_none());
    }
}
