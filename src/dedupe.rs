//! Cross-source record deduplication.
//!
//! Records harvested from different sources frequently describe the same
//! work with inconsistent identifiers, title formatting and author naming.
//! This module reconciles them into one canonical record per work and keeps
//! an auditable report of every decision.
//!
//! ## Stages
//!
//! 1. **Preparation**: each record gets a `normalized_title`, and its DOI is
//!    resolved (explicit field, else extracted from `url`, else from
//!    `abstract`) and rewritten in lowercase.
//! 2. **Exact grouping**: records sharing a DOI form one group.
//! 3. **Fuzzy matching**: records without any DOI are clustered by title
//!    similarity in a single left-to-right sweep. Each unclaimed record
//!    anchors a group and is compared with every later unclaimed record:
//!    - score ≥ `fuzzy_threshold_exact`: merged unconditionally
//!    - `fuzzy_threshold_candidate` ≤ score < exact: merged only when the
//!      first authors share a surname and the years are at most one apart;
//!      otherwise flagged for human review if score ≥ `human_review_threshold_low`
//!    - below the candidate threshold: ignored
//! 4. **Canonicalization**: one record per group survives, preferring a
//!    journal source, and lists every member id in `member_ids`.
//!
//! Grouping is not a transitive closure. A record only joins a group by
//! matching the anchor directly, and the first group to claim a record keeps
//! it, so input order matters.
//!
//! ## Usage
//!
//! ```rust
//! use litreview::Record;
//! use litreview::dedupe::{DedupeConfig, Deduplicator};
//!
//! let records = vec![
//!     Record {
//!         id: "gh:1".to_string(),
//!         title: Some("EEGNet: a compact CNN for EEG-based BCIs".to_string()),
//!         source: "GitHub".to_string(),
//!         ..Default::default()
//!     },
//!     Record {
//!         id: "gs:2".to_string(),
//!         title: Some("EEGNet - A Compact CNN for EEG based BCIs".to_string()),
//!         source: "Google Scholar".to_string(),
//!         ..Default::default()
//!     },
//! ];
//!
//! let deduplicator = Deduplicator::new().with_config(DedupeConfig::default());
//! let (canonical, report) = deduplicator.dedupe(records);
//!
//! assert_eq!(canonical.len(), 1);
//! assert_eq!(canonical[0].member_ids.as_ref().unwrap().len(), 2);
//! assert_eq!(report.fuzzy_groups.len(), 1);
//! ```
//!
//! ## Singleton groups
//!
//! `member_ids` is only set on records that absorbed at least one duplicate.
//! A DOI group of one still appears in the report's `same_doi` bucket, but
//! its record passes through without `member_ids`, exactly like an
//! unmatched record from the fuzzy stage.

mod normalize;
mod report;
mod similarity;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Record, Result, ReviewError};

pub(crate) use normalize::{doi_start, resolve_identifier};
pub use normalize::{extract_doi, normalize_title};
pub use report::{DuplicateReport, GroupEntry, ReviewCandidate};
pub use similarity::{SimilarityMetric, token_set_ratio};

const DEFAULT_FUZZY_THRESHOLD_EXACT: f64 = 0.92;
const DEFAULT_FUZZY_THRESHOLD_CANDIDATE: f64 = 0.85;
const DEFAULT_HUMAN_REVIEW_THRESHOLD_LOW: f64 = 0.80;

/// Thresholds controlling the fuzzy matching stage.
///
/// # Examples
///
/// ```
/// use litreview::dedupe::DedupeConfig;
///
/// let config = DedupeConfig {
///     fuzzy_threshold_exact: 0.95,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    /// Floor for unconditional merges
    pub fuzzy_threshold_exact: f64,
    /// Floor for merges that need author and year corroboration
    pub fuzzy_threshold_candidate: f64,
    /// Floor for flagging an uncorroborated candidate for human review
    pub human_review_threshold_low: f64,
    /// Title similarity measure
    pub similarity: SimilarityMetric,
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold_exact: DEFAULT_FUZZY_THRESHOLD_EXACT,
            fuzzy_threshold_candidate: DEFAULT_FUZZY_THRESHOLD_CANDIDATE,
            human_review_threshold_low: DEFAULT_HUMAN_REVIEW_THRESHOLD_LOW,
            similarity: SimilarityMetric::default(),
        }
    }
}

impl DedupeConfig {
    /// Checks that every threshold lies in `[0, 1]` and that they are ordered
    /// `human_review_threshold_low <= fuzzy_threshold_candidate <= fuzzy_threshold_exact`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("fuzzy_threshold_exact", self.fuzzy_threshold_exact),
            ("fuzzy_threshold_candidate", self.fuzzy_threshold_candidate),
            ("human_review_threshold_low", self.human_review_threshold_low),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReviewError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.fuzzy_threshold_candidate > self.fuzzy_threshold_exact {
            return Err(ReviewError::Config(format!(
                "fuzzy_threshold_candidate ({}) exceeds fuzzy_threshold_exact ({})",
                self.fuzzy_threshold_candidate, self.fuzzy_threshold_exact
            )));
        }
        if self.human_review_threshold_low > self.fuzzy_threshold_candidate {
            return Err(ReviewError::Config(format!(
                "human_review_threshold_low ({}) exceeds fuzzy_threshold_candidate ({})",
                self.human_review_threshold_low, self.fuzzy_threshold_candidate
            )));
        }
        Ok(())
    }
}

/// Outcome of comparing a fuzzy-stage anchor with a later record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchDecision {
    Merge,
    Review,
    Distinct,
}

/// Deduplication engine folding cross-source duplicates into canonical records.
///
/// The engine holds only its configuration, so one instance can be reused
/// for any number of independent runs.
///
/// # Examples
///
/// ```
/// use litreview::dedupe::Deduplicator;
///
/// let (canonical, report) = Deduplicator::new().dedupe(Vec::new());
/// assert!(canonical.is_empty());
/// assert!(report.is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    config: DedupeConfig,
}

impl Deduplicator {
    /// Creates a new Deduplicator with the default thresholds (0.92 / 0.85 / 0.80).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: DedupeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DedupeConfig {
        &self.config
    }

    /// Deduplicates `records`, returning the canonical records and the report.
    ///
    /// Canonical records from DOI groups come first, in order of each DOI's
    /// first appearance, followed by the fuzzy stage's records in anchor
    /// order. Every returned record carries `normalized_title`; resolved DOIs
    /// are lowercase; `member_ids` is set on records that absorbed duplicates.
    pub fn dedupe(&self, mut records: Vec<Record>) -> (Vec<Record>, DuplicateReport) {
        let mut report = DuplicateReport::new();
        let input_count = records.len();
        if records.is_empty() {
            return (records, report);
        }

        let (doi_groups, unidentified) = Self::group_by_identifier(&mut records);
        let fuzzy_groups = self.cluster_fuzzy(&records, &unidentified, &mut report);

        let mut slots: Vec<Option<Record>> = records.into_iter().map(Some).collect();
        let mut canonical_records = Vec::with_capacity(doi_groups.len() + fuzzy_groups.len());

        for (doi, indices) in doi_groups {
            let group = Self::take_group(&mut slots, &indices);
            let members: Vec<String> = group.iter().map(|r| r.id.clone()).collect();
            if let Some(canonical) = canonicalize(group) {
                report.record_exact_group(&doi, &canonical.id, members);
                canonical_records.push(canonical);
            }
        }

        for indices in fuzzy_groups {
            let group = Self::take_group(&mut slots, &indices);
            let members: Vec<String> = group.iter().map(|r| r.id.clone()).collect();
            if let Some(canonical) = canonicalize(group) {
                if members.len() > 1 {
                    report.record_fuzzy_group(&canonical.id, members);
                }
                canonical_records.push(canonical);
            }
        }

        info!(
            input = input_count,
            canonical = canonical_records.len(),
            doi_groups = report.same_doi.len(),
            fuzzy_groups = report.fuzzy_groups.len(),
            human_review = report.human_review.len(),
            "deduplication finished"
        );

        (canonical_records, report)
    }

    /// Normalizes every record and partitions them by DOI.
    ///
    /// Returns the DOI groups in order of first appearance and the indices of
    /// records with no DOI at all.
    fn group_by_identifier(records: &mut [Record]) -> (Vec<(String, Vec<usize>)>, Vec<usize>) {
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut unidentified = Vec::new();

        for (idx, record) in records.iter_mut().enumerate() {
            record.normalized_title = record
                .title
                .as_deref()
                .map(normalize_title)
                .unwrap_or_default();

            match resolve_identifier(record) {
                Some(doi) => {
                    record.doi = Some(doi.clone());
                    match group_index.get(&doi) {
                        Some(&position) => groups[position].1.push(idx),
                        None => {
                            group_index.insert(doi.clone(), groups.len());
                            groups.push((doi, vec![idx]));
                        }
                    }
                }
                None => unidentified.push(idx),
            }
        }

        (groups, unidentified)
    }

    /// Greedy single-pass clustering of DOI-less records by title similarity.
    ///
    /// Returns every cluster, singletons included, in anchor order.
    fn cluster_fuzzy(
        &self,
        records: &[Record],
        candidates: &[usize],
        report: &mut DuplicateReport,
    ) -> Vec<Vec<usize>> {
        let mut claimed = vec![false; candidates.len()];
        let mut clusters = Vec::new();

        for (position, &anchor_idx) in candidates.iter().enumerate() {
            if claimed[position] {
                continue;
            }
            claimed[position] = true;

            let anchor = &records[anchor_idx];
            let mut cluster = vec![anchor_idx];

            for (offset, &other_idx) in candidates.iter().enumerate().skip(position + 1) {
                if claimed[offset] {
                    continue;
                }

                let other = &records[other_idx];
                let score = self
                    .config
                    .similarity
                    .score(&anchor.normalized_title, &other.normalized_title);

                match self.classify(anchor, other, score) {
                    MatchDecision::Merge => {
                        debug!(anchor = %anchor.id, other = %other.id, score, "fuzzy merge");
                        claimed[offset] = true;
                        cluster.push(other_idx);
                    }
                    MatchDecision::Review => {
                        debug!(anchor = %anchor.id, other = %other.id, score, "flagged for human review");
                        report.flag_for_review(
                            (&anchor.id, &other.id),
                            score,
                            (anchor.title.as_deref(), other.title.as_deref()),
                        );
                    }
                    MatchDecision::Distinct => {}
                }
            }

            clusters.push(cluster);
        }

        clusters
    }

    fn classify(&self, anchor: &Record, other: &Record, score: f64) -> MatchDecision {
        if score >= self.config.fuzzy_threshold_exact {
            MatchDecision::Merge
        } else if score < self.config.fuzzy_threshold_candidate {
            MatchDecision::Distinct
        } else if corroborated(anchor, other) {
            MatchDecision::Merge
        } else if score >= self.config.human_review_threshold_low {
            MatchDecision::Review
        } else {
            MatchDecision::Distinct
        }
    }

    fn take_group(slots: &mut [Option<Record>], indices: &[usize]) -> Vec<Record> {
        indices.iter().filter_map(|&idx| slots[idx].take()).collect()
    }
}

/// Whether two records agree on first-author surname and on year within one.
///
/// A missing author or an unparseable year on either side fails corroboration.
pub fn corroborated(a: &Record, b: &Record) -> bool {
    let same_author = matches!(
        (a.first_author_surname(), b.first_author_surname()),
        (Some(x), Some(y)) if x == y
    );
    let years_close = matches!(
        (a.year_value(), b.year_value()),
        (Some(x), Some(y)) if (x - y).abs() <= 1
    );
    same_author && years_close
}

/// Picks the canonical record of a duplicate group.
///
/// The first member whose source mentions "journal" wins; otherwise the
/// first member. When the group has more than one member the winner gets
/// `member_ids` listing every member in group order. Returns `None` only for
/// an empty group.
///
/// # Examples
///
/// ```
/// use litreview::Record;
/// use litreview::dedupe::canonicalize;
///
/// let group = vec![
///     Record::new("gh:1", "GitHub"),
///     Record::new("jne:2", "Journal of Neural Engineering"),
/// ];
/// let canonical = canonicalize(group).unwrap();
/// assert_eq!(canonical.id, "jne:2");
/// assert_eq!(canonical.member_ids, Some(vec!["gh:1".to_string(), "jne:2".to_string()]));
/// ```
pub fn canonicalize(mut group: Vec<Record>) -> Option<Record> {
    if group.is_empty() {
        return None;
    }

    let chosen = group.iter().position(is_journal_source).unwrap_or(0);
    let member_ids: Vec<String> = group.iter().map(|r| r.id.clone()).collect();
    let mut canonical = group.swap_remove(chosen);
    if member_ids.len() > 1 {
        canonical.member_ids = Some(member_ids);
    }
    Some(canonical)
}

fn is_journal_source(record: &Record) -> bool {
    record.source.to_lowercase().contains("journal")
}
