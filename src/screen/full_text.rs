//! Second screening stage over extracted full text.

use crate::screen::{Decision, ExclusionReason, ScreeningDecision, Stage};
use crate::utils::truncate_chars;
use crate::{FullText, Record};

const DL_KEYWORDS: [&str; 8] = [
    "cnn",
    "convolution",
    "rnn",
    "lstm",
    "transformer",
    "deep neural",
    "deep network",
    "neural network",
];
const METRIC_KEYWORDS: [&str; 9] = [
    "accuracy",
    "f1",
    "roc",
    "auc",
    "sensitivity",
    "specificity",
    "precision",
    "recall",
    "confusion matrix",
];

const SNIPPET_WINDOW: usize = 200;
const EVIDENCE_LENGTH: usize = 400;

/// Returns the text around the first keyword hit, `window` characters on each side.
///
/// Keywords are tried in order; the first one present wins even if a later
/// keyword occurs earlier in the text.
pub(crate) fn find_snippet(text: &str, keywords: &[&str], window: usize) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    // ASCII lowercasing keeps byte offsets aligned with the original text
    let lowered = text.to_ascii_lowercase();
    let byte_idx = keywords.iter().find_map(|k| lowered.find(k))?;
    let char_idx = text[..byte_idx].chars().count();
    let start = char_idx.saturating_sub(window);
    let end = char_idx + window;
    Some(text.chars().skip(start).take(end - start).collect())
}

/// Screens one title/abstract-included record on its full text.
///
/// A record whose full text and abstract both lack any deep-learning
/// architecture term is excluded for insufficient methodological detail; a
/// full text without any performance metric is excluded next. Otherwise the
/// record is included with the surrounding snippet as evidence.
#[must_use]
pub fn screen_full_text(record: &Record, full_text: &FullText) -> ScreeningDecision {
    let text = full_text.pdf_text.as_deref().unwrap_or_default();

    let exclude = |reason: ExclusionReason, evidence: &str| ScreeningDecision {
        decision: Decision::Exclude,
        stage: Stage::FullText,
        exclusion_label: Some(reason),
        evidence_snippet: evidence.to_string(),
        confidence: reason.confidence(),
        bias: None,
    };

    let dl_snippet = find_snippet(text, &DL_KEYWORDS, SNIPPET_WINDOW);
    if dl_snippet.is_none() {
        let abstract_text = record
            .abstract_text
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        if !DL_KEYWORDS.iter().any(|k| abstract_text.contains(k)) {
            return exclude(
                ExclusionReason::InsufficientMethodology,
                "No DL architecture mention in full text or abstract",
            );
        }
    }

    let Some(metric_snippet) = find_snippet(text, &METRIC_KEYWORDS, SNIPPET_WINDOW) else {
        return exclude(
            ExclusionReason::NoPerformanceMetrics,
            "No metrics found in full text",
        );
    };

    ScreeningDecision {
        decision: Decision::Include,
        stage: Stage::FullText,
        exclusion_label: None,
        evidence_snippet: truncate_chars(
            dl_snippet.as_deref().unwrap_or(&metric_snippet),
            EVIDENCE_LENGTH,
        ),
        confidence: 0.95,
        bias: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full_text(text: &str) -> FullText {
        FullText {
            pdf_text: Some(text.to_string()),
            pdf_url: None,
        }
    }

    #[test]
    fn test_find_snippet_window() {
        let text = format!("{}LSTM{}", "a".repeat(300), "b".repeat(300));
        let snippet = find_snippet(&text, &DL_KEYWORDS, 200).unwrap();
        assert_eq!(snippet.chars().count(), 400);
        assert!(snippet.starts_with(&"a".repeat(200)));
        assert!(snippet.contains("LSTM"));
    }

    #[test]
    fn test_find_snippet_multibyte_text() {
        let text = "Électroencéphalographie: un réseau CNN à 8 couches";
        let snippet = find_snippet(text, &["cnn"], 5).unwrap();
        assert_eq!(snippet, "seau CNN à");
    }

    #[test]
    fn test_find_snippet_missing() {
        assert_eq!(find_snippet("", &DL_KEYWORDS, 200), None);
        assert_eq!(find_snippet("plain text", &DL_KEYWORDS, 200), None);
    }

    #[test]
    fn test_include_with_dl_and_metrics() {
        let decision = screen_full_text(
            &Record::default(),
            &full_text("We trained a convolutional network. Accuracy was 91%."),
        );
        assert_eq!(decision.decision, Decision::Include);
        assert_eq!(decision.stage, Stage::FullText);
        assert!(decision.evidence_snippet.contains("convolution"));
    }

    #[test]
    fn test_dl_term_only_in_abstract() {
        let record = Record {
            abstract_text: Some("An LSTM model for EEG.".to_string()),
            ..Default::default()
        };
        let decision = screen_full_text(&record, &full_text("Balanced accuracy reached 0.8."));
        assert_eq!(decision.decision, Decision::Include);
        assert!(decision.evidence_snippet.contains("accuracy"));
    }

    #[test]
    fn test_insufficient_methodology() {
        let decision = screen_full_text(&Record::default(), &full_text("Accuracy was 91%."));
        assert_eq!(
            decision.exclusion_label,
            Some(ExclusionReason::InsufficientMethodology)
        );
        assert_eq!(decision.confidence, 0.8);
    }

    #[test]
    fn test_no_metrics() {
        let decision = screen_full_text(&Record::default(), &full_text("A transformer model."));
        assert_eq!(
            decision.exclusion_label,
            Some(ExclusionReason::NoPerformanceMetrics)
        );
        assert_eq!(decision.confidence, 0.9);
    }

    #[test]
    fn test_missing_full_text() {
        let decision = screen_full_text(&Record::default(), &FullText::default());
        assert_eq!(decision.decision, Decision::Exclude);
    }
}
