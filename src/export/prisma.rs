//! PRISMA flow-diagram counts.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Serialize, Serializer};

use crate::dedupe::DuplicateReport;
use crate::export::create_output;
use crate::screen::ScreenedRecord;
use crate::{Result, ReviewError};

// Keeps sources in configuration order
fn serialize_ordered_counts<S: Serializer>(
    counts: &[(String, usize)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(counts.iter().map(|(k, v)| (k, v)))
}

/// Screening tallies for the flow diagram.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScreeningCounts {
    pub title_abstract_screened: usize,
    pub title_abstract_excluded: usize,
    pub full_text_assessed: usize,
    pub full_text_excluded: usize,
    pub included: usize,
    pub title_abstract_exclusions: BTreeMap<String, usize>,
    pub full_text_exclusions: BTreeMap<String, usize>,
}

impl ScreeningCounts {
    #[must_use]
    pub fn tally(records: &[ScreenedRecord]) -> Self {
        let mut counts = ScreeningCounts {
            title_abstract_screened: records.len(),
            ..Default::default()
        };
        for screened in records {
            if let Some(reason) = screened.title_abstract.exclusion_label {
                counts.title_abstract_excluded += 1;
                *counts
                    .title_abstract_exclusions
                    .entry(reason.label().to_string())
                    .or_default() += 1;
            }
            if let Some(full_text) = &screened.full_text {
                counts.full_text_assessed += 1;
                if let Some(reason) = full_text.exclusion_label {
                    counts.full_text_excluded += 1;
                    *counts
                        .full_text_exclusions
                        .entry(reason.label().to_string())
                        .or_default() += 1;
                }
            }
            if screened.full_text.is_some() && screened.is_included() {
                counts.included += 1;
            }
        }
        counts
    }
}

/// Counts behind a PRISMA flow diagram, built up stage by stage.
///
/// # Examples
///
/// ```
/// use litreview::export::PrismaReport;
///
/// let report = PrismaReport::identification(vec![
///     ("PubMed".to_string(), 12),
///     ("CrossRef".to_string(), 30),
/// ]);
/// assert_eq!(report.total_identified, 42);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrismaReport {
    #[serde(serialize_with = "serialize_ordered_counts")]
    pub records_by_source: Vec<(String, usize)>,
    pub total_identified: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<DuplicateReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub de_dup_count: Option<usize>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub screening: Option<ScreeningCounts>,
}

impl PrismaReport {
    /// Starts a report from the per-source identification counts.
    #[must_use]
    pub fn identification(records_by_source: Vec<(String, usize)>) -> Self {
        let total_identified = records_by_source.iter().map(|(_, n)| n).sum();
        Self {
            records_by_source,
            total_identified,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_duplicates(mut self, duplicates: DuplicateReport, de_dup_count: usize) -> Self {
        self.duplicates = Some(duplicates);
        self.de_dup_count = Some(de_dup_count);
        self
    }

    #[must_use]
    pub fn with_screening(mut self, records: &[ScreenedRecord]) -> Self {
        self.screening = Some(ScreeningCounts::tally(records));
        self
    }

    /// Pretty-printed JSON rendering of the report.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Export` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReviewError::Export(e.to_string()))
    }
}

/// Writes `report` as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns an error when the file cannot be created or written.
pub fn write_prisma_json_file(path: &Path, report: &PrismaReport) -> Result<()> {
    let writer = create_output(path)?;
    serde_json::to_writer_pretty(writer, report).map_err(|e| ReviewError::Export(e.to_string()))
}
