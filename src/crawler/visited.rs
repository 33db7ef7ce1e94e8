use crate::url::canonicalize_url;
use std::collections::HashSet;
use url::Url;

/// What happened when a link was offered to the visited set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// First time this canonical URL is seen; it is now marked visited
    New(Url),
    /// Already dispatched earlier in this crawl
    Seen,
    /// The link cannot be canonicalized and is never dispatched
    Invalid,
}

/// URLs dispatched during one crawl run
///
/// Lives inside a single crawl's context and is dropped with it. Detail links
/// are keyed by canonical URL. Inline records are keyed by their source URL as
/// given, in a separate set, so the two identities never collide.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
    inline_keys: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalizes `url` and marks it visited
    pub fn insert_url(&mut self, url: &str) -> Visit {
        let canonical = match canonicalize_url(url) {
            Ok(canonical) => canonical,
            Err(e) => {
                tracing::debug!(url, error = %e, "Link cannot be canonicalized");
                return Visit::Invalid;
            }
        };
        if self.urls.insert(canonical.as_str().to_string()) {
            Visit::New(canonical)
        } else {
            Visit::Seen
        }
    }

    /// Marks an inline record's source URL visited; returns false if it was
    /// already present
    pub fn insert_key(&mut self, key: &str) -> bool {
        self.inline_keys.insert(key.trim().to_string())
    }
}
