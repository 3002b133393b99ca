use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use sha2::{Digest, Sha256};

use crate::dedupe::{doi_start, normalize_title};

/// Formats a DOI string by removing URL prefixes and `[doi]` suffixes and lowercasing it.
///
/// Returns `None` unless a DOI-shaped token (`10.<registrant>/<suffix>`)
/// starts on a word boundary; everything from that token on is kept.
///
/// # Arguments
///
/// * `doi_str` - The DOI string to format
pub(crate) fn format_doi(doi_str: &str) -> Option<String> {
    let doi = doi_str
        .trim()
        .trim_end_matches("[doi]")
        .replace(|c: char| c.is_whitespace(), "")
        .to_lowercase();

    // Anything before the match is a prefix such as a resolver URL or "doi:"
    doi_start(&doi).map(|pos| doi[pos..].to_string())
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub(crate) fn clean_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates `text` to at most `length` characters.
pub(crate) fn truncate_chars(text: &str, length: usize) -> String {
    text.chars().take(length).collect()
}

/// Parses the leading four characters of a year-like value, e.g. `"2019-05-01"`.
pub(crate) fn year_prefix(value: &str) -> Option<i32> {
    let value = value.trim();
    let prefix: String = value.chars().take(4).collect();
    prefix.parse().ok()
}

/// Builds reproducible ids for records that arrived without one.
///
/// The digest covers the normalized title and the source name, so the same
/// harvested item receives the same id on every run. Repeats of a title
/// within one payload are salted with their occurrence number, which keeps
/// ids unique within the source while the first occurrence keeps the
/// unsalted id.
#[derive(Debug, Default)]
pub(crate) struct StableIds {
    seen: HashMap<String, usize>,
}

impl StableIds {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mint(&mut self, prefix: &str, title: &str, source: &str) -> String {
        let base = stable_record_id(prefix, title, source, 0);
        let occurrence = self.seen.entry(base.clone()).or_insert(0);
        let id = match *occurrence {
            0 => base,
            n => stable_record_id(prefix, title, source, n),
        };
        *occurrence += 1;
        id
    }
}

fn stable_record_id(prefix: &str, title: &str, source: &str, occurrence: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_title(title).as_bytes());
    hasher.update([0u8]);
    hasher.update(source.as_bytes());
    if occurrence > 0 {
        hasher.update([0u8]);
        hasher.update(occurrence.to_le_bytes());
    }
    let digest = format!("{:x}", hasher.finalize());
    format!("{}:{}", prefix, &digest[..16])
}

/// Maps a record id onto a string that is safe to use as a file stem.
pub(crate) fn file_stem_for_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawYear {
    Int(i64),
    Text(String),
}

/// Accepts a year delivered as a JSON number, a string or null.
pub(crate) fn deserialize_year<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawYear>::deserialize(deserializer)?;
    Ok(raw.and_then(|year| match year {
        RawYear::Int(n) => Some(n.to_string()),
        RawYear::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_doi() {
        let test_cases = vec![
            ("10.1000/test", Some("10.1000/test".to_string())),
            ("10.1000/test [doi]", Some("10.1000/test".to_string())),
            ("https://doi.org/10.1000/test", Some("10.1000/test".to_string())),
            ("http://dx.doi.org/10.1000/test", Some("10.1000/test".to_string())),
            (" https://doi.org/10.1000/test ", Some("10.1000/test".to_string())),
            ("doi:10.1000/test", Some("10.1000/test".to_string())),
            ("DOI: 10.1000/test", Some("10.1000/test".to_string())),
            ("DOI:10.1000/TEST", Some("10.1000/test".to_string())),
            ("HTTPS://DOI.ORG/10.1000/TEST", Some("10.1000/test".to_string())),
            ("", None),
            ("   ", None),
            ("N/A", None),
            ("PMC2010.5", None),
            ("PMC2010.1234/x", None),
            ("10.5", None),
            ("10.12/short", None),
            ("https://doi.org/10.1000/abc(1)", Some("10.1000/abc(1)".to_string())),
        ];

        for (input, expected) in test_cases {
            assert_eq!(format_doi(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(clean_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(clean_whitespace(""), "");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_year_prefix() {
        assert_eq!(year_prefix("2019"), Some(2019));
        assert_eq!(year_prefix("2019-05-01"), Some(2019));
        assert_eq!(year_prefix(" 2019 Dec"), Some(2019));
        assert_eq!(year_prefix("n.d."), None);
    }

    #[test]
    fn test_stable_ids_are_reproducible() {
        let a = StableIds::new().mint("gs", "EEG-Based Deep Learning: A Review", "Google Scholar");
        let b = StableIds::new().mint("gs", "eeg based deep learning review", "Google Scholar");
        let c = StableIds::new().mint("gs", "eeg based deep learning review", "Other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("gs:"));
        assert_eq!(a.len(), "gs:".len() + 16);
    }

    #[test]
    fn test_stable_ids_salt_repeated_titles() {
        let mut ids = StableIds::new();
        let first = ids.mint("csv", "EEG decoding", "Manual");
        let second = ids.mint("csv", "EEG Decoding!", "Manual");
        let third = ids.mint("csv", "eeg decoding", "Manual");
        let other = ids.mint("csv", "Another title", "Manual");

        assert_eq!(first, StableIds::new().mint("csv", "EEG decoding", "Manual"));
        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_ne!(first, third);
        assert_eq!(other, StableIds::new().mint("csv", "Another title", "Manual"));

        let mut replay = StableIds::new();
        let replayed: Vec<String> = (0..3)
            .map(|_| replay.mint("csv", "EEG decoding", "Manual"))
            .collect();
        assert_eq!(replayed, vec![first, second, third]);
    }

    #[test]
    fn test_file_stem_for_id() {
        assert_eq!(file_stem_for_id("pubmed:123/4"), "pubmed_123_4");
    }
}
