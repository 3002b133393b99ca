//! Risk-of-bias heuristics over title and abstract text.
//!
//! The assessment never excludes a record on its own; it surfaces studies
//! whose reporting deserves a closer look by a reviewer.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::Record;
use crate::regex::Regex;

static CROSS_VALIDATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"cross-?validation|k-?fold|leave-?one-?subject|loso|leave-?one-?out").unwrap()
});
static EXTERNAL_TEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"external validation|independent test|external test set|test set independent")
        .unwrap()
});
static SMALL_SAMPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(n=\d{1,2})\b|\b(number of subjects|participants)\b").unwrap()
});
static OVERFITTING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"overfit|over-?fitting|data leakage|leakage").unwrap());

const NO_CV_WEIGHT: f64 = 0.35;
const NO_EXTERNAL_TEST_WEIGHT: f64 = 0.25;
const SMALL_SAMPLE_WEIGHT: f64 = 0.20;
const OVERFIT_WEIGHT: f64 = 0.20;

/// Which reporting indicators were found in the text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasFlags {
    pub cv_reported: bool,
    pub external_test_reported: bool,
    pub small_sample_mentioned: bool,
    pub overfit_terms_found: bool,
}

/// Heuristic caution score in `[0, 1]` with the indicators behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasAssessment {
    pub bias_score: f64,
    pub flags: BiasFlags,
}

impl BiasAssessment {
    /// Names of the flags that are set, in declaration order.
    #[must_use]
    pub fn raised_flags(&self) -> Vec<&'static str> {
        [
            ("cv_reported", self.flags.cv_reported),
            ("external_test_reported", self.flags.external_test_reported),
            ("small_sample_mentioned", self.flags.small_sample_mentioned),
            ("overfit_terms_found", self.flags.overfit_terms_found),
        ]
        .into_iter()
        .filter_map(|(name, raised)| raised.then_some(name))
        .collect()
    }
}

/// Scores how cautiously a study's reported methodology should be read.
///
/// Missing cross-validation adds 0.35, a missing external test set 0.25, a
/// small-sample mention 0.20 and overfitting or leakage terms 0.20. The sum
/// is clamped to 1 and rounded to two decimals.
///
/// # Examples
///
/// ```
/// use litreview::Record;
/// use litreview::screen::assess_bias;
///
/// let record = Record {
///     abstract_text: Some("We report 10-fold cross-validation on n=12 subjects.".to_string()),
///     ..Default::default()
/// };
/// let bias = assess_bias(&record);
/// assert!(bias.flags.cv_reported);
/// assert_eq!(bias.bias_score, 0.45);
/// ```
#[must_use]
pub fn assess_bias(record: &Record) -> BiasAssessment {
    let text = format!(
        "{} {}",
        record.title.as_deref().unwrap_or_default(),
        record.abstract_text.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    let flags = BiasFlags {
        cv_reported: CROSS_VALIDATION.is_match(&text),
        external_test_reported: EXTERNAL_TEST.is_match(&text),
        small_sample_mentioned: SMALL_SAMPLE.is_match(&text),
        overfit_terms_found: OVERFITTING.is_match(&text),
    };

    let mut score = 0.0;
    if !flags.cv_reported {
        score += NO_CV_WEIGHT;
    }
    if !flags.external_test_reported {
        score += NO_EXTERNAL_TEST_WEIGHT;
    }
    if flags.small_sample_mentioned {
        score += SMALL_SAMPLE_WEIGHT;
    }
    if flags.overfit_terms_found {
        score += OVERFIT_WEIGHT;
    }

    BiasAssessment {
        bias_score: (score.min(1.0_f64) * 100.0).round() / 100.0,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn record(text: &str) -> Record {
        Record {
            title: Some("EEG classification".to_string()),
            abstract_text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("Nothing about validation.", 0.6)]
    #[case("Leave-one-subject-out evaluation.", 0.25)]
    #[case("LOSO and an independent test cohort.", 0.0)]
    #[case("k-fold cv, overfitting was observed, n=9", 0.65)]
    #[case("No CV. Possible data leakage among participants.", 1.0)]
    fn test_bias_score(#[case] text: &str, #[case] expected: f64) {
        assert_eq!(assess_bias(&record(text)).bias_score, expected);
    }

    #[test]
    fn test_flags_and_raised_names() {
        let bias = assess_bias(&record(
            "Ten-fold cross-validation with external validation; n=15 volunteers.",
        ));
        assert_eq!(
            bias.flags,
            BiasFlags {
                cv_reported: true,
                external_test_reported: true,
                small_sample_mentioned: true,
                overfit_terms_found: false,
            }
        );
        assert_eq!(
            bias.raised_flags(),
            vec!["cv_reported", "external_test_reported", "small_sample_mentioned"]
        );
    }

    #[test]
    fn test_case_insensitive() {
        let bias = assess_bias(&Record {
            title: Some("CROSS-VALIDATION of a CNN".to_string()),
            ..Default::default()
        });
        assert!(bias.flags.cv_reported);
    }
}
