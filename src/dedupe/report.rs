//! Audit trail of grouping decisions.

use serde::{Deserialize, Serialize};

/// One duplicate group, recorded by id so it outlives the records themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    /// Id of the record chosen to represent the group
    pub canonical: String,
    /// Ids of every member in original group order, the canonical one included
    pub members: Vec<String>,
    /// Normalized DOI shared by the group, for identifier-exact groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

/// A near-duplicate pair left unmerged for a human to adjudicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCandidate {
    /// Anchor id and compared id
    pub pair: (String, String),
    /// Title similarity in `[0, 1]`
    pub score: f64,
    /// Original titles of both records
    pub titles: (Option<String>, Option<String>),
}

/// Structured report of every grouping decision made during one run.
///
/// Append-only; nothing in the pipeline reads it back except the exporters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups formed by identical normalized DOI, singletons included
    pub same_doi: Vec<GroupEntry>,
    /// Multi-member groups formed by fuzzy title matching
    pub fuzzy_groups: Vec<GroupEntry>,
    /// Candidate-band pairs that failed corroboration
    pub human_review: Vec<ReviewCandidate>,
}

impl DuplicateReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_exact_group(&mut self, doi: &str, canonical: &str, members: Vec<String>) {
        self.same_doi.push(GroupEntry {
            canonical: canonical.to_string(),
            members,
            doi: Some(doi.to_string()),
        });
    }

    pub fn record_fuzzy_group(&mut self, canonical: &str, members: Vec<String>) {
        self.fuzzy_groups.push(GroupEntry {
            canonical: canonical.to_string(),
            members,
            doi: None,
        });
    }

    pub fn flag_for_review(
        &mut self,
        pair: (&str, &str),
        score: f64,
        titles: (Option<&str>, Option<&str>),
    ) {
        self.human_review.push(ReviewCandidate {
            pair: (pair.0.to_string(), pair.1.to_string()),
            score,
            titles: (titles.0.map(String::from), titles.1.map(String::from)),
        });
    }

    /// Number of records folded away into another canonical record.
    pub fn removed_count(&self) -> usize {
        self.same_doi
            .iter()
            .chain(&self.fuzzy_groups)
            .map(|group| group.members.len().saturating_sub(1))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.same_doi.is_empty() && self.fuzzy_groups.is_empty() && self.human_review.is_empty()
    }
}
