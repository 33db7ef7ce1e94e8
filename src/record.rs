//! Paper records and corpus partitions
//!
//! A [`CandidateRecord`] is whatever a venue adapter managed to extract from a
//! page. It only becomes a [`PaperRecord`] once title, authors and abstract
//! are all non-empty after whitespace normalization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One venue/year slice of the corpus
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    pub venue: String,
    pub year: u16,
}

impl Partition {
    pub fn new(venue: impl Into<String>, year: u16) -> Self {
        Self {
            venue: venue.into(),
            year,
        }
    }

    /// Key used for export file names, e.g. `NeurIPS_2023`
    pub fn key(&self) -> String {
        format!("{}_{}", self.venue, self.year)
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.venue, self.year)
    }
}

/// Fields extracted by an adapter, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: String,
    pub source_url: String,
}

/// A validated paper, ready for the corpus
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    /// Ordered author names joined with `", "`
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub venue: String,
    pub year: u16,
    pub source_url: String,
}

impl PaperRecord {
    /// Validates a candidate and attaches provenance
    ///
    /// Returns `None` when the title, the author list or the abstract is empty
    /// after normalization. Empty author names are discarded before the check.
    pub fn from_candidate(candidate: CandidateRecord, partition: &Partition) -> Option<Self> {
        let title = normalize_text(&candidate.title);
        let authors = candidate
            .authors
            .iter()
            .map(|a| normalize_text(a))
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let abstract_text = normalize_text(&candidate.abstract_text);

        if title.is_empty() || authors.is_empty() || abstract_text.is_empty() {
            return None;
        }

        Some(Self {
            title,
            authors,
            abstract_text,
            venue: partition.venue.clone(),
            year: partition.year,
            source_url: candidate.source_url,
        })
    }

    pub fn partition(&self) -> Partition {
        Partition::new(self.venue.clone(), self.year)
    }

    /// Text handed to the indexing side for embedding
    pub fn document_text(&self) -> String {
        format!(
            "Title: {}\nAuthors: {}\nAbstract: {}",
            self.title, self.authors, self.abstract_text
        )
    }
}

/// Collapses whitespace runs (including NBSP) to single spaces and trims
pub fn normalize_text(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
