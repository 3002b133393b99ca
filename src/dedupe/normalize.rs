//! Title and identifier normalization used as grouping keys.

use std::sync::LazyLock;

use deunicode::deunicode;
use itertools::Itertools;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::Record;
use crate::regex::Regex;
use crate::utils::format_doi;

static DOI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b10\.\d{4,9}/[-._;()/:A-Z0-9]+\b").unwrap());

const STOPWORDS: [&str; 11] = [
    "a", "an", "the", "of", "in", "on", "and", "for", "with", "to", "by",
];

/// Normalizes a free-text title into a comparable token string.
///
/// Diacritics are stripped and every other non-ASCII letter is
/// transliterated, so Greek, Cyrillic and CJK titles keep their tokens.
/// The text is then lowercased, every run of non-alphanumeric characters
/// becomes a token break and stopwords are dropped. An empty title yields
/// an empty string.
///
/// # Examples
///
/// ```
/// use litreview::dedupe::normalize_title;
///
/// assert_eq!(
///     normalize_title("EEG-Based Deep Learning: A Review"),
///     "eeg based deep learning review"
/// );
/// ```
pub fn normalize_title(title: &str) -> String {
    let stripped: String = title.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let folded = deunicode(&stripped).to_lowercase();

    folded
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty() && !STOPWORDS.contains(token))
        .join(" ")
}

/// Finds the first DOI-shaped token in arbitrary text.
///
/// The match is case-insensitive and is returned with the casing it has in `text`.
///
/// # Examples
///
/// ```
/// use litreview::dedupe::extract_doi;
///
/// let text = "...available at 10.1109/TNSRE.2020.1234567 for details...";
/// assert_eq!(extract_doi(text).as_deref(), Some("10.1109/TNSRE.2020.1234567"));
/// ```
pub fn extract_doi(text: &str) -> Option<String> {
    DOI_REGEX.find(text).map(|m| m.as_str().to_string())
}

/// Byte offset of the first DOI-shaped token in `text`.
pub(crate) fn doi_start(text: &str) -> Option<usize> {
    DOI_REGEX.find(text).map(|m| m.start())
}

/// Resolves the grouping identifier of a record, lowercased.
///
/// The explicit `doi` field wins; otherwise the first DOI found in `url`,
/// then in `abstract`.
pub(crate) fn resolve_identifier(record: &Record) -> Option<String> {
    record
        .doi
        .as_deref()
        .and_then(format_doi)
        .or_else(|| record.url.as_deref().and_then(extract_doi))
        .or_else(|| record.abstract_text.as_deref().and_then(extract_doi))
        .map(|doi| doi.to_lowercase())
}
