//! A pipeline for systematic literature reviews: harvest, deduplicate, screen, report.
//!
//! `litreview` takes publication records harvested from several bibliographic
//! sources, folds cross-source duplicates into canonical records, screens them
//! in two stages and writes PRISMA-style artifacts.
//!
//! # Key Features
//!
//! - **Source Payload Parsing**: Turn saved API responses into records:
//!   - PubMed `efetch` XML
//!   - CrossRef, IEEE Xplore and GitHub search JSON
//!   - Scholar result lists
//!   - CSV with configurable header mappings
//!
//! - **Cross-Source Deduplication**:
//!   - DOI normalization and extraction from URLs and abstracts
//!   - Exact grouping by DOI
//!   - Token-set fuzzy title matching with tiered thresholds
//!   - First-author and year corroboration for borderline matches
//!   - Journal-source preference for the canonical record
//!   - An auditable duplicate report with a human-review queue
//!
//! - **Screening and Reporting**:
//!   - Title/abstract and full-text screening rules
//!   - Heuristic risk-of-bias flags
//!   - CSV, BibTeX and PRISMA JSON exports
//!
//! # Basic Usage
//!
//! ```rust
//! use litreview::Record;
//! use litreview::dedupe::Deduplicator;
//!
//! let records = vec![
//!     Record {
//!         id: "pubmed:1".to_string(),
//!         title: Some("EEG decoding with CNNs".to_string()),
//!         doi: Some("10.1000/XYZ123".to_string()),
//!         source: "PubMed".to_string(),
//!         ..Default::default()
//!     },
//!     Record {
//!         id: "crossref:10.1000/xyz123".to_string(),
//!         title: Some("EEG Decoding with CNNs".to_string()),
//!         doi: Some("10.1000/xyz123".to_string()),
//!         source: "CrossRef".to_string(),
//!         ..Default::default()
//!     },
//! ];
//!
//! let (canonical, report) = Deduplicator::new().dedupe(records);
//! assert_eq!(canonical.len(), 1);
//! assert_eq!(report.same_doi.len(), 1);
//! ```
//!
//! # Parsing Source Payloads
//!
//! ```rust
//! use litreview::SourceParser;
//! use litreview::sources::GitHubParser;
//!
//! let input = r#"{"items": [{"id": 7, "name": "eeg-net", "owner": {"login": "lab"},
//!                "description": "EEGNet in PyTorch", "html_url": "https://github.com/lab/eeg-net"}]}"#;
//! let records = GitHubParser::new().parse(input).unwrap();
//! assert_eq!(records[0].id, "github:7");
//! ```
//!
//! # Error Handling
//!
//! The library uses a custom [`Result`] type that wraps [`ReviewError`]. The
//! deduplication engine itself never fails: missing or malformed optional
//! fields simply count as absent evidence.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod dedupe;
pub mod export;
pub mod fulltext;
pub mod pipeline;
mod regex;
pub mod screen;
pub mod sources;
mod utils;

// Reexports
pub use config::PipelineConfig;
pub use dedupe::{DedupeConfig, Deduplicator, DuplicateReport};
pub use fulltext::FullText;
pub use pipeline::{Pipeline, PipelineSummary};

/// A specialized Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Represents errors that can occur outside the deduplication core.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Error: {0}")]
    Other(String),
}

impl From<csv::Error> for ReviewError {
    fn from(err: csv::Error) -> Self {
        ReviewError::InvalidFormat(err.to_string())
    }
}

#[cfg(feature = "pubmed")]
impl From<quick_xml::Error> for ReviewError {
    fn from(err: quick_xml::Error) -> Self {
        ReviewError::InvalidFormat(err.to_string())
    }
}

#[cfg(feature = "pubmed")]
impl From<quick_xml::events::attributes::AttrError> for ReviewError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ReviewError::InvalidFormat(err.to_string())
    }
}

impl From<serde_json::Error> for ReviewError {
    fn from(err: serde_json::Error) -> Self {
        ReviewError::InvalidFormat(err.to_string())
    }
}

impl From<toml::de::Error> for ReviewError {
    fn from(err: toml::de::Error) -> Self {
        ReviewError::Config(err.to_string())
    }
}

/// A bibliographic reference harvested from one source.
///
/// `id` is unique within its source only. `normalized_title` and
/// `member_ids` are filled in by the deduplicator; `member_ids` is present
/// only on canonical records that absorbed at least one duplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Source-qualified identifier, e.g. `pubmed:31181385`
    pub id: String,
    /// Title of the work
    #[serde(default)]
    pub title: Option<String>,
    /// Author display names in listed order
    #[serde(default)]
    pub authors: Vec<String>,
    /// Publication year as delivered by the source
    #[serde(default, deserialize_with = "utils::deserialize_year")]
    pub year: Option<String>,
    /// Digital Object Identifier
    #[serde(default)]
    pub doi: Option<String>,
    /// Landing page
    #[serde(default)]
    pub url: Option<String>,
    /// Abstract text
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Name of the originating system
    #[serde(default)]
    pub source: String,
    /// Language, English when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Direct PDF link when the source exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    /// Comparison key produced during deduplication
    #[serde(default)]
    pub normalized_title: String,
    /// Ids of every record folded into this one, itself included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_ids: Option<Vec<String>>,
}

impl Record {
    /// Creates an otherwise empty record with an id and a source.
    #[must_use]
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    /// The year as an integer, when the raw value parses as one.
    pub fn year_value(&self) -> Option<i32> {
        self.year.as_deref().and_then(|y| y.trim().parse().ok())
    }

    /// Lowercased final token of the first listed author.
    pub fn first_author_surname(&self) -> Option<String> {
        self.authors
            .first()
            .and_then(|name| name.split_whitespace().last())
            .map(str::to_lowercase)
    }

    /// Ids this record stands for: `member_ids` when set, else its own id.
    pub fn original_ids(&self) -> Vec<String> {
        self.member_ids
            .clone()
            .unwrap_or_else(|| vec![self.id.clone()])
    }

    /// Whether the record absorbed duplicates during canonicalization.
    pub fn has_duplicates(&self) -> bool {
        self.member_ids.as_ref().is_some_and(|ids| ids.len() > 1)
    }
}

/// Trait for turning a source's saved response payload into records.
pub trait SourceParser {
    /// Parse a payload containing zero or more records.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidFormat` if the payload is malformed
    fn parse(&self, input: &str) -> Result<Vec<Record>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_review_error_display() {
        let error = ReviewError::InvalidFormat("Invalid line".to_string());
        assert_eq!(error.to_string(), "Parse error: Invalid line");
    }

    #[test]
    fn test_year_value() {
        let mut record = Record::new("x:1", "X");
        assert_eq!(record.year_value(), None);
        record.year = Some(" 2021 ".to_string());
        assert_eq!(record.year_value(), Some(2021));
        record.year = Some("2021 Mar".to_string());
        assert_eq!(record.year_value(), None);
    }

    #[test]
    fn test_first_author_surname() {
        let mut record = Record::new("x:1", "X");
        assert_eq!(record.first_author_surname(), None);
        record.authors = vec!["Ana María  Gómez".to_string(), "B Lee".to_string()];
        assert_eq!(record.first_author_surname().as_deref(), Some("gómez"));
        record.authors = vec!["   ".to_string()];
        assert_eq!(record.first_author_surname(), None);
    }

    #[test]
    fn test_record_deserializes_mixed_year_shapes() {
        let json = r#"[
            {"id": "a", "source": "CrossRef", "year": 2020},
            {"id": "b", "source": "PubMed", "year": "2019"},
            {"id": "c", "source": "GitHub", "year": null, "abstract": "text"}
        ]"#;
        let records: Vec<Record> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].year.as_deref(), Some("2020"));
        assert_eq!(records[1].year_value(), Some(2019));
        assert_eq!(records[2].year, None);
        assert_eq!(records[2].abstract_text.as_deref(), Some("text"));
    }

    #[test]
    fn test_original_ids() {
        let mut record = Record::new("gh:1", "GitHub");
        assert_eq!(record.original_ids(), vec!["gh:1".to_string()]);
        assert!(!record.has_duplicates());
        record.member_ids = Some(vec!["gh:1".to_string(), "gs:2".to_string()]);
        assert!(record.has_duplicates());
    }
}
