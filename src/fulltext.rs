//! Full-text retrieval from a local artifacts directory.
//!
//! Articles are never downloaded by the crate. For each record the loader
//! looks in the full-text directory for `<id>.txt` (pre-extracted text) and,
//! with the `pdf` feature enabled, `<id>.pdf`, where `<id>` is the record id
//! with every character outside `[A-Za-z0-9-]` replaced by `_`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::file_stem_for_id;
use crate::{Record, Result};

/// Article text gathered for the full-text screening stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullText {
    pub pdf_text: Option<String>,
    pub pdf_url: Option<String>,
}

/// Loads whatever full text is available locally for `record`.
///
/// A record without a matching file yields a [`FullText`] without text, which
/// the full-text stage treats as reporting nothing.
///
/// # Errors
///
/// Returns an error when a matching file exists but cannot be read, or when a
/// PDF cannot be parsed.
pub fn load_full_text(dir: &Path, record: &Record) -> Result<FullText> {
    let stem = file_stem_for_id(&record.id);
    let mut full_text = FullText {
        pdf_text: None,
        pdf_url: record.pdf_url.clone(),
    };

    let text_path = dir.join(format!("{}.txt", stem));
    if text_path.is_file() {
        full_text.pdf_text = Some(fs::read_to_string(&text_path)?);
        debug!(id = %record.id, path = %text_path.display(), "loaded pre-extracted text");
        return Ok(full_text);
    }

    #[cfg(feature = "pdf")]
    {
        let pdf_path = dir.join(format!("{}.pdf", stem));
        if pdf_path.is_file() {
            full_text.pdf_text = Some(extract_pdf_text(&pdf_path)?);
            debug!(id = %record.id, path = %pdf_path.display(), "extracted PDF text");
            return Ok(full_text);
        }
    }

    debug!(id = %record.id, "no full text available");
    Ok(full_text)
}

/// Extracts the text layer of a PDF file.
///
/// # Errors
///
/// Returns `ReviewError::InvalidFormat` when the document cannot be parsed.
#[cfg(feature = "pdf")]
pub fn extract_pdf_text(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path).map_err(|e| {
        crate::ReviewError::InvalidFormat(format!("PDF extraction failed for {}: {}", path.display(), e))
    })
}

/// Extracts the text layer of an in-memory PDF.
///
/// # Errors
///
/// Returns `ReviewError::InvalidFormat` when the document cannot be parsed.
#[cfg(feature = "pdf")]
pub fn extract_pdf_text_from_bytes(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| crate::ReviewError::InvalidFormat(format!("PDF extraction failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_loads_text_file_by_sanitized_id() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pubmed_123.txt"), "A CNN reached 90% accuracy.").unwrap();

        let record = Record {
            id: "pubmed:123".to_string(),
            pdf_url: Some("https://example.org/123.pdf".to_string()),
            ..Default::default()
        };
        let full_text = load_full_text(dir.path(), &record).unwrap();
        assert_eq!(
            full_text,
            FullText {
                pdf_text: Some("A CNN reached 90% accuracy.".to_string()),
                pdf_url: Some("https://example.org/123.pdf".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_file_yields_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let full_text = load_full_text(dir.path(), &Record::new("ieee:9", "IEEE Xplore")).unwrap();
        assert_eq!(full_text, FullText::default());
    }
}
