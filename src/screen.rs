//! Two-stage eligibility screening of canonical records.
//!
//! The title/abstract stage applies inclusion rules to metadata only; the
//! full-text stage looks for architecture and metric reporting in the
//! extracted article text. Both stages produce a [`ScreeningDecision`] with
//! an exclusion label, an evidence snippet and a confidence value.
//!
//! # Example
//!
//! ```
//! use litreview::Record;
//! use litreview::screen::{Decision, ExclusionReason, ScreeningCriteria, screen_all};
//!
//! let records = vec![
//!     Record {
//!         id: "a".to_string(),
//!         title: Some("EEG motor imagery classification with CNNs".to_string()),
//!         year: Some("2020".to_string()),
//!         ..Default::default()
//!     },
//!     Record {
//!         id: "b".to_string(),
//!         title: Some("A survey of EEG decoding".to_string()),
//!         year: Some("2020".to_string()),
//!         ..Default::default()
//!     },
//! ];
//!
//! let screened = screen_all(records, &ScreeningCriteria::new(Some(2015), None), false);
//! assert_eq!(screened[0].title_abstract.decision, Decision::Include);
//! assert_eq!(
//!     screened[1].title_abstract.exclusion_label,
//!     Some(ExclusionReason::ReviewOrSurvey)
//! );
//! ```

mod bias;
mod full_text;
mod title_abstract;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{FullText, Record};

pub use bias::{BiasAssessment, BiasFlags, assess_bias};
pub use full_text::screen_full_text;
pub use title_abstract::screen_title_abstract;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Include,
    Exclude,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Include => write!(f, "Include"),
            Decision::Exclude => write!(f, "Exclude"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TitleAbstract,
    FullText,
}

/// Why a record was excluded. Serializes as the human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExclusionReason {
    #[serde(rename = "Outside date range")]
    OutsideDateRange,
    #[serde(rename = "Review/survey papers")]
    ReviewOrSurvey,
    #[serde(rename = "Not EEG-BCI focused")]
    NotEegBci,
    #[serde(rename = "Not classification-focused")]
    NotClassification,
    #[serde(rename = "Non-English")]
    NonEnglish,
    #[serde(rename = "Insufficient methodological detail")]
    InsufficientMethodology,
    #[serde(rename = "No performance metrics reported")]
    NoPerformanceMetrics,
}

impl ExclusionReason {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ExclusionReason::OutsideDateRange => "Outside date range",
            ExclusionReason::ReviewOrSurvey => "Review/survey papers",
            ExclusionReason::NotEegBci => "Not EEG-BCI focused",
            ExclusionReason::NotClassification => "Not classification-focused",
            ExclusionReason::NonEnglish => "Non-English",
            ExclusionReason::InsufficientMethodology => "Insufficient methodological detail",
            ExclusionReason::NoPerformanceMetrics => "No performance metrics reported",
        }
    }

    /// Confidence attached to an exclusion for this reason.
    #[must_use]
    pub fn confidence(self) -> f64 {
        match self {
            ExclusionReason::OutsideDateRange | ExclusionReason::ReviewOrSurvey => 0.95,
            ExclusionReason::NotEegBci | ExclusionReason::NoPerformanceMetrics => 0.9,
            ExclusionReason::NotClassification => 0.85,
            ExclusionReason::NonEnglish => 0.98,
            ExclusionReason::InsufficientMethodology => 0.8,
        }
    }
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one screening stage for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningDecision {
    pub decision: Decision,
    pub stage: Stage,
    pub exclusion_label: Option<ExclusionReason>,
    pub evidence_snippet: String,
    pub confidence: f64,
    /// Only the title/abstract stage assesses bias.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bias: Option<BiasAssessment>,
}

impl ScreeningDecision {
    #[must_use]
    pub fn is_included(&self) -> bool {
        self.decision == Decision::Include
    }
}

/// Eligibility bounds for the title/abstract stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningCriteria {
    /// Earliest accepted publication year; `None` leaves the range open.
    pub date_from: Option<i32>,
    pub date_to: Option<i32>,
    /// Language assumed for records that do not state one.
    pub default_language: String,
}

impl Default for ScreeningCriteria {
    fn default() -> Self {
        Self {
            date_from: None,
            date_to: None,
            default_language: "English".to_string(),
        }
    }
}

impl ScreeningCriteria {
    #[must_use]
    pub fn new(date_from: Option<i32>, date_to: Option<i32>) -> Self {
        Self {
            date_from,
            date_to,
            ..Default::default()
        }
    }
}

/// A canonical record together with its screening history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenedRecord {
    pub record: Record,
    pub title_abstract: ScreeningDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<ScreeningDecision>,
    #[serde(skip)]
    pub full_text_source: Option<FullText>,
}

impl ScreenedRecord {
    #[must_use]
    pub fn new(record: Record, title_abstract: ScreeningDecision) -> Self {
        Self {
            record,
            title_abstract,
            full_text: None,
            full_text_source: None,
        }
    }

    /// Records the full-text stage outcome.
    pub fn apply_full_text(&mut self, full_text: FullText) {
        let decision = screen_full_text(&self.record, &full_text);
        if self.record.pdf_url.is_none() {
            self.record.pdf_url = full_text.pdf_url.clone();
        }
        self.full_text = Some(decision);
        self.full_text_source = Some(full_text);
    }

    /// The most recent decision: full text when assessed, else title/abstract.
    #[must_use]
    pub fn latest_decision(&self) -> &ScreeningDecision {
        self.full_text.as_ref().unwrap_or(&self.title_abstract)
    }

    /// Included once every stage reached so far included it.
    #[must_use]
    pub fn is_included(&self) -> bool {
        self.title_abstract.is_included()
            && self.full_text.as_ref().is_none_or(ScreeningDecision::is_included)
    }
}

/// Runs the title/abstract stage over every record, keeping input order.
///
/// With `parallel` set and the `parallel` feature compiled in, records are
/// screened on the rayon thread pool.
#[must_use]
pub fn screen_all(
    records: Vec<Record>,
    criteria: &ScreeningCriteria,
    parallel: bool,
) -> Vec<ScreenedRecord> {
    let screen_one = |record: Record| {
        let decision = screen_title_abstract(&record, criteria);
        debug!(
            id = %record.id,
            decision = %decision.decision,
            label = decision.exclusion_label.map(ExclusionReason::label),
            "title/abstract screened"
        );
        ScreenedRecord::new(record, decision)
    };

    #[cfg(feature = "parallel")]
    if parallel {
        use rayon::prelude::*;
        return records.into_par_iter().map(screen_one).collect();
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    records.into_iter().map(screen_one).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eeg_record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            title: Some(format!("EEG classification study {}", id)),
            year: Some("2020".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_exclusion_reason_serializes_as_label() {
        let json = serde_json::to_string(&ExclusionReason::NotEegBci).unwrap();
        assert_eq!(json, "\"Not EEG-BCI focused\"");
        assert_eq!(ExclusionReason::NonEnglish.to_string(), "Non-English");
    }

    #[test]
    fn test_screen_all_preserves_order() {
        let records: Vec<Record> = (0..50).map(|i| eeg_record(&i.to_string())).collect();
        let criteria = ScreeningCriteria::default();

        let sequential = screen_all(records.clone(), &criteria, false);
        let parallel = screen_all(records, &criteria, true);

        let ids = |screened: &[ScreenedRecord]| {
            screened.iter().map(|s| s.record.id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&sequential), ids(&parallel));
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_full_text_stage_updates_inclusion() {
        let mut screened = screen_all(vec![eeg_record("x")], &ScreeningCriteria::default(), false)
            .pop()
            .unwrap();
        assert!(screened.is_included());
        assert_eq!(screened.latest_decision().stage, Stage::TitleAbstract);

        screened.apply_full_text(FullText {
            pdf_text: Some("No methods described.".to_string()),
            pdf_url: Some("https://example.org/x.pdf".to_string()),
        });
        assert!(!screened.is_included());
        assert_eq!(screened.latest_decision().stage, Stage::FullText);
        assert_eq!(
            screened.record.pdf_url.as_deref(),
            Some("https://example.org/x.pdf")
        );
    }
}
