//! First screening stage over title and abstract metadata.

use crate::Record;
use crate::screen::bias::assess_bias;
use crate::screen::{Decision, ExclusionReason, ScreeningCriteria, ScreeningDecision, Stage};
use crate::utils::{truncate_chars, year_prefix};

const EEG_KEYWORDS: [&str; 4] = ["eeg", "electroencephalography", "brain-computer interface", "bci"];
const CLASSIFICATION_KEYWORDS: [&str; 8] = [
    "classif",
    "classifier",
    "accuracy",
    "f1",
    "roc",
    "auc",
    "sensitivity",
    "specificity",
];
const REVIEW_KEYWORDS: [&str; 4] = ["review", "survey", "systematic review", "meta-analysis"];

const EVIDENCE_LENGTH: usize = 400;

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Screens one record on its title and abstract.
///
/// Rules apply in order and the first that fires excludes the record:
/// publication year outside the criteria's bounds, review or survey
/// wording, no EEG/BCI wording, no classification wording, and finally a
/// non-English language. Records passing every rule are included. The
/// bias assessment is attached to every decision.
///
/// # Examples
///
/// ```
/// use litreview::Record;
/// use litreview::screen::{Decision, ScreeningCriteria, screen_title_abstract};
///
/// let record = Record {
///     title: Some("CNN classification of EEG motor imagery".to_string()),
///     year: Some("2021".to_string()),
///     ..Default::default()
/// };
/// let decision = screen_title_abstract(&record, &ScreeningCriteria::new(Some(2015), Some(2024)));
/// assert_eq!(decision.decision, Decision::Include);
/// ```
#[must_use]
pub fn screen_title_abstract(record: &Record, criteria: &ScreeningCriteria) -> ScreeningDecision {
    let title = record.title.as_deref().unwrap_or_default();
    let abstract_text = record.abstract_text.as_deref().unwrap_or_default();
    let text = format!("{} {}", title, abstract_text).to_lowercase();
    let headline = if title.is_empty() { abstract_text } else { title };

    let exclude = |reason: ExclusionReason, evidence: String| ScreeningDecision {
        decision: Decision::Exclude,
        stage: Stage::TitleAbstract,
        exclusion_label: Some(reason),
        evidence_snippet: evidence,
        confidence: reason.confidence(),
        bias: Some(assess_bias(record)),
    };

    if let Some(year) = record.year.as_deref().and_then(year_prefix) {
        let too_early = criteria.date_from.is_some_and(|from| year < from);
        let too_late = criteria.date_to.is_some_and(|to| year > to);
        if too_early || too_late {
            return exclude(ExclusionReason::OutsideDateRange, headline.to_string());
        }
    }

    if contains_any(&text, &REVIEW_KEYWORDS) {
        return exclude(ExclusionReason::ReviewOrSurvey, headline.to_string());
    }

    if !contains_any(&text, &EEG_KEYWORDS) {
        return exclude(ExclusionReason::NotEegBci, headline.to_string());
    }

    if !contains_any(&text, &CLASSIFICATION_KEYWORDS) {
        return exclude(ExclusionReason::NotClassification, headline.to_string());
    }

    let language = record
        .language
        .as_deref()
        .unwrap_or(criteria.default_language.as_str());
    if !language.trim().is_empty() && !language.trim().eq_ignore_ascii_case("english") {
        return exclude(ExclusionReason::NonEnglish, format!("language:{}", language));
    }

    ScreeningDecision {
        decision: Decision::Include,
        stage: Stage::TitleAbstract,
        exclusion_label: None,
        evidence_snippet: truncate_chars(headline, EVIDENCE_LENGTH),
        confidence: 0.95,
        bias: Some(assess_bias(record)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn record(title: &str, abstract_text: &str, year: Option<&str>) -> Record {
        Record {
            id: "r1".to_string(),
            title: Some(title.to_string()),
            abstract_text: Some(abstract_text.to_string()),
            year: year.map(str::to_string),
            source: "PubMed".to_string(),
            ..Default::default()
        }
    }

    fn criteria() -> ScreeningCriteria {
        ScreeningCriteria::new(Some(2015), Some(2024))
    }

    #[rstest]
    #[case("EEG motor imagery classification", "", Some("2010"), Some(ExclusionReason::OutsideDateRange))]
    #[case("EEG motor imagery classification", "", Some("2026-01-01"), Some(ExclusionReason::OutsideDateRange))]
    #[case("Deep learning for EEG: a systematic review", "accuracy", Some("2020"), Some(ExclusionReason::ReviewOrSurvey))]
    #[case("CNN classification of ECG arrhythmia", "", Some("2020"), Some(ExclusionReason::NotEegBci))]
    #[case("EEG source localisation", "We map cortical sources.", Some("2020"), Some(ExclusionReason::NotClassification))]
    #[case("EEG motor imagery decoding", "Accuracy of 85% was reached.", Some("2020"), None)]
    #[case("Brain-Computer Interface classifier", "", None, None)]
    #[case("EEG classification", "", Some("n.d."), None)]
    fn test_rules(
        #[case] title: &str,
        #[case] abstract_text: &str,
        #[case] year: Option<&str>,
        #[case] expected: Option<ExclusionReason>,
    ) {
        let decision = screen_title_abstract(&record(title, abstract_text, year), &criteria());
        assert_eq!(decision.exclusion_label, expected);
        assert_eq!(decision.stage, Stage::TitleAbstract);
        assert!(decision.bias.is_some());
        let expected_decision = if expected.is_some() {
            Decision::Exclude
        } else {
            Decision::Include
        };
        assert_eq!(decision.decision, expected_decision);
    }

    #[test]
    fn test_non_english() {
        let mut r = record("EEG classification with CNN", "", Some("2020"));
        r.language = Some("German".to_string());
        let decision = screen_title_abstract(&r, &criteria());
        assert_eq!(decision.exclusion_label, Some(ExclusionReason::NonEnglish));
        assert_eq!(decision.evidence_snippet, "language:German");
        assert_eq!(decision.confidence, 0.98);
    }

    #[test]
    fn test_default_language_applies_when_missing() {
        let mut criteria = criteria();
        criteria.default_language = "French".to_string();
        let decision =
            screen_title_abstract(&record("EEG classification", "", Some("2020")), &criteria);
        assert_eq!(decision.exclusion_label, Some(ExclusionReason::NonEnglish));
    }

    #[test]
    fn test_include_evidence_is_truncated_title() {
        let long_title = format!("EEG classification {}", "x".repeat(500));
        let decision = screen_title_abstract(&record(&long_title, "", None), &criteria());
        assert_eq!(decision.decision, Decision::Include);
        assert_eq!(decision.evidence_snippet.chars().count(), 400);
        assert_eq!(decision.confidence, 0.95);
    }

    #[test]
    fn test_unbounded_criteria_skip_date_rule() {
        let decision = screen_title_abstract(
            &record("EEG classification", "", Some("1990")),
            &ScreeningCriteria::default(),
        );
        assert_eq!(decision.decision, Decision::Include);
    }
}
