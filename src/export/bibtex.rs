use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use crate::export::create_output;
use crate::{Record, Result};

fn escape(value: &str) -> String {
    value.replace('{', "\\{").replace('}', "\\}")
}

/// Renders records as `@article` entries keyed by DOI, or by id when absent.
///
/// Empty fields are left out of the entry.
///
/// # Examples
///
/// ```
/// use litreview::Record;
/// use litreview::export::to_bibtex;
///
/// let record = Record {
///     id: "pubmed:1".to_string(),
///     title: Some("EEGNet".to_string()),
///     doi: Some("10.1088/1741-2552/aace8c".to_string()),
///     ..Default::default()
/// };
/// let bib = to_bibtex([&record]);
/// assert!(bib.starts_with("@article{10.1088/1741-2552/aace8c,"));
/// ```
#[must_use]
pub fn to_bibtex<'a>(records: impl IntoIterator<Item = &'a Record>) -> String {
    let mut out = String::new();
    for record in records {
        let key = record.doi.as_deref().unwrap_or(&record.id);
        let authors = record.authors.join(" and ");
        let fields = [
            ("title", record.title.as_deref().unwrap_or_default()),
            ("author", authors.as_str()),
            ("year", record.year.as_deref().unwrap_or_default()),
            ("doi", record.doi.as_deref().unwrap_or_default()),
            ("url", record.url.as_deref().unwrap_or_default()),
        ];

        // Writing to a String cannot fail
        let _ = writeln!(out, "@article{{{},", key);
        for (name, value) in fields.iter().filter(|(_, v)| !v.trim().is_empty()) {
            let _ = writeln!(out, "  {} = {{{}}},", name, escape(value));
        }
        out.push_str("}\n\n");
    }
    out
}

/// Writes the BibTeX library for `records` to `path`.
///
/// # Errors
///
/// Returns an error when the file cannot be created or written.
pub fn write_bibtex_file<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a Record>,
) -> Result<()> {
    let mut writer = create_output(path)?;
    writer.write_all(to_bibtex(records).as_bytes())?;
    writer.flush()?;
    Ok(())
}
