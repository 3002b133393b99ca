//! Parsers for the payloads returned by bibliographic source APIs.
//!
//! Fetching is left to the caller; each parser turns one saved response body
//! into [`Record`]s tagged with the parser's source name.
//!
//! # Example
//!
//! ```
//! use litreview::SourceParser;
//! use litreview::sources::{CrossRefParser, SourceFormat};
//!
//! let input = r#"{"message": {"items": [{"DOI": "10.1000/xyz123", "title": ["EEG decoding"]}]}}"#;
//! let records = CrossRefParser::new().parse(input).unwrap();
//! assert_eq!(records[0].id, "crossref:10.1000/xyz123");
//!
//! let parser = SourceFormat::CrossRefJson.parser("CrossRef").unwrap();
//! assert_eq!(parser.parse(input).unwrap().len(), 1);
//! ```

mod crossref;
mod csv;
mod github;
mod ieee;
#[cfg(feature = "pubmed")]
mod pubmed;
mod scholar;

use serde::{Deserialize, Serialize};

use crate::{Result, ReviewError, SourceParser};

pub use crossref::CrossRefParser;
pub use self::csv::{CsvConfig, CsvParser};
pub use github::GitHubParser;
pub use ieee::IeeeParser;
#[cfg(feature = "pubmed")]
pub use pubmed::PubMedXmlParser;
pub use scholar::ScholarParser;

/// Payload format of a configured source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    PubmedXml,
    #[serde(rename = "crossref_json")]
    CrossRefJson,
    IeeeJson,
    #[serde(rename = "github_json")]
    GitHubJson,
    ScholarJson,
    Csv,
}

impl SourceFormat {
    /// Builds the parser for this format, tagging records with `source`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Config` when the format's support was not compiled in.
    pub fn parser(self, source: &str) -> Result<Box<dyn SourceParser>> {
        let parser: Box<dyn SourceParser> = match self {
            #[cfg(feature = "pubmed")]
            SourceFormat::PubmedXml => Box::new(PubMedXmlParser::new().with_source(source)),
            #[cfg(not(feature = "pubmed"))]
            SourceFormat::PubmedXml => {
                return Err(ReviewError::Config(
                    "PubMed XML support requires the \"pubmed\" feature".to_string(),
                ));
            }
            SourceFormat::CrossRefJson => Box::new(CrossRefParser::new().with_source(source)),
            SourceFormat::IeeeJson => Box::new(IeeeParser::new().with_source(source)),
            SourceFormat::GitHubJson => Box::new(GitHubParser::new().with_source(source)),
            SourceFormat::ScholarJson => Box::new(ScholarParser::new().with_source(source)),
            SourceFormat::Csv => Box::new(CsvParser::new().with_source(source)),
        };
        Ok(parser)
    }
}

/// Renders a JSON scalar as text, for ids and years that APIs send as either.
pub(crate) fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Treats blank strings as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parses a JSON payload, mapping an empty body to `None`.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(input: &str) -> Result<Option<T>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(input)
        .map(Some)
        .map_err(|e| ReviewError::InvalidFormat(format!("Invalid JSON payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_format_deserializes() {
        let formats: Vec<SourceFormat> = serde_json::from_value(json!([
            "pubmed_xml",
            "crossref_json",
            "ieee_json",
            "github_json",
            "scholar_json",
            "csv"
        ]))
        .unwrap();
        assert_eq!(formats[1], SourceFormat::CrossRefJson);
        assert_eq!(formats[3], SourceFormat::GitHubJson);
        assert_eq!(formats[5], SourceFormat::Csv);
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!(2020)), Some("2020".to_string()));
        assert_eq!(scalar_to_string(&json!(" 8901 ")), Some("8901".to_string()));
        assert_eq!(scalar_to_string(&json!("")), None);
        assert_eq!(scalar_to_string(&json!(null)), None);
    }

    #[test]
    fn test_parse_json_empty_body() {
        let parsed: Option<serde_json::Value> = parse_json("  \n").unwrap();
        assert!(parsed.is_none());
        assert!(parse_json::<serde_json::Value>("{not json").is_err());
    }
}
