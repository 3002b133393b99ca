//! One spreadsheet row per canonical record with both screening stages.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::export::create_output;
use crate::screen::{Decision, ExclusionReason, ScreenedRecord};
use crate::{Result, ReviewError};

/// A flattened CSV row. Column order follows field order.
#[derive(Debug, Serialize)]
pub struct CsvRow<'a> {
    pub canonical_id: &'a str,
    pub source: &'a str,
    pub original_ids: String,
    pub title: Option<&'a str>,
    pub authors: String,
    pub year: Option<&'a str>,
    pub doi: Option<&'a str>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<&'a str>,
    pub pdf_url: Option<&'a str>,
    pub url: Option<&'a str>,
    pub language: &'a str,
    pub stage_title_abstract_decision: Decision,
    pub stage_title_abstract_label: Option<ExclusionReason>,
    pub stage_title_abstract_evidence: &'a str,
    pub stage_full_text_decision: Option<Decision>,
    pub stage_full_text_label: Option<ExclusionReason>,
    pub stage_full_text_evidence: Option<&'a str>,
    pub confidence: f64,
    pub bias_score: Option<f64>,
    pub bias_flags: String,
}

impl<'a> From<&'a ScreenedRecord> for CsvRow<'a> {
    fn from(screened: &'a ScreenedRecord) -> Self {
        let record = &screened.record;
        let title_abstract = &screened.title_abstract;
        let full_text = screened.full_text.as_ref();
        let bias = title_abstract.bias.as_ref();

        CsvRow {
            canonical_id: &record.id,
            source: &record.source,
            original_ids: record.original_ids().join(";"),
            title: record.title.as_deref(),
            authors: record.authors.join(";"),
            year: record.year.as_deref(),
            doi: record.doi.as_deref(),
            abstract_text: record.abstract_text.as_deref(),
            pdf_url: record.pdf_url.as_deref(),
            url: record.url.as_deref(),
            language: record.language.as_deref().unwrap_or("English"),
            stage_title_abstract_decision: title_abstract.decision,
            stage_title_abstract_label: title_abstract.exclusion_label,
            stage_title_abstract_evidence: &title_abstract.evidence_snippet,
            stage_full_text_decision: full_text.map(|d| d.decision),
            stage_full_text_label: full_text.and_then(|d| d.exclusion_label),
            stage_full_text_evidence: full_text.map(|d| d.evidence_snippet.as_str()),
            confidence: screened.latest_decision().confidence,
            bias_score: bias.map(|b| b.bias_score),
            bias_flags: bias.map(|b| b.raised_flags().join(";")).unwrap_or_default(),
        }
    }
}

/// Writes the screening table with a header row.
///
/// # Errors
///
/// Returns `ReviewError::Export` when a row cannot be written.
pub fn write_csv<W: Write>(writer: W, records: &[ScreenedRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for screened in records {
        writer
            .serialize(CsvRow::from(screened))
            .map_err(|e| ReviewError::Export(format!("CSV row for {}: {}", screened.record.id, e)))?;
    }
    writer
        .flush()
        .map_err(|e| ReviewError::Export(e.to_string()))
}

/// Writes the screening table to `path`.
///
/// # Errors
///
/// Returns an error when the file cannot be created or written.
pub fn write_csv_file(path: &Path, records: &[ScreenedRecord]) -> Result<()> {
    write_csv(create_output(path)?, records)
}
