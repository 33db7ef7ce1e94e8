//! Small HTML extraction helpers shared by the venue adapters
//!
//! Selectors are parsed on every call. An invalid selector yields no matches
//! and is logged, so one bad rule can only empty its own field.

use crate::record::normalize_text;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::error!(selector = css, error = ?e, "Invalid CSS selector");
            None
        }
    }
}

/// All elements under `scope` matching `css`
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(css) {
        Some(selector) => scope.select(&selector).collect(),
        None => Vec::new(),
    }
}

/// First element in the document matching `css`
pub fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = parse_selector(css)?;
    document.select(&selector).next()
}

/// The `n`-th (1-based) direct child element of `parent` named `tag`
pub fn nth_child_of_type<'a>(parent: ElementRef<'a>, tag: &str, n: usize) -> Option<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == tag)
        .nth(n.checked_sub(1)?)
}

/// Normalized text of an element and all its descendants
pub fn text_of(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// Normalized text of an element's direct text children only
pub fn own_text(element: ElementRef<'_>) -> String {
    let text: String = element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ");
    normalize_text(&text)
}

/// Normalized text of the first element matching `css`, if non-empty
pub fn first_text(document: &Html, css: &str) -> Option<String> {
    select_first(document, css)
        .map(text_of)
        .filter(|text| !text.is_empty())
}

/// Normalized, non-empty texts of every element matching `css`
pub fn all_texts(document: &Html, css: &str) -> Vec<String> {
    select_all(document.root_element(), css)
        .into_iter()
        .map(text_of)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Splits a single comma-separated author line into names
pub fn split_authors(line: &str) -> Vec<String> {
    line.split(',')
        .map(normalize_text)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Absolute `href` targets of every element matching `css`
pub fn links(document: &Html, css: &str, base_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    select_all(document.root_element(), css)
        .into_iter()
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, &base))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
