//! CrossRef `/works` response parser.

use serde::Deserialize;

use crate::sources::{non_empty, parse_json};
use crate::{Record, Result, SourceParser};

const DEFAULT_SOURCE: &str = "CrossRef";

#[derive(Debug, Default, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    message: WorksMessage,
}

#[derive(Debug, Default, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<WorkItem>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<WorkAuthor>,
    issued: Option<WorkDate>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkAuthor {
    #[serde(default)]
    given: String,
    #[serde(default)]
    family: String,
}

#[derive(Debug, Default, Deserialize)]
struct WorkDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

/// Parser for CrossRef works search responses.
#[derive(Debug, Clone)]
pub struct CrossRefParser {
    source: String,
}

impl Default for CrossRefParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossRefParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    fn to_record(&self, item: WorkItem) -> Record {
        let doi = non_empty(item.doi);
        let year = item
            .issued
            .and_then(|date| date.date_parts.into_iter().next())
            .and_then(|parts| parts.into_iter().next().flatten())
            .map(|year| year.to_string());

        Record {
            id: format!("crossref:{}", doi.as_deref().unwrap_or("no-doi")),
            title: item.title.into_iter().next(),
            authors: item
                .author
                .iter()
                .map(|a| format!("{} {}", a.given, a.family).trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            year,
            doi,
            url: non_empty(item.url),
            abstract_text: non_empty(item.abstract_text),
            source: self.source.clone(),
            ..Default::default()
        }
    }
}

impl SourceParser for CrossRefParser {
    fn parse(&self, input: &str) -> Result<Vec<Record>> {
        let response: Option<WorksResponse> = parse_json(input)?;
        Ok(response
            .map(|r| r.message.items)
            .unwrap_or_default()
            .into_iter()
            .map(|item| self.to_record(item))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_works() {
        let input = r#"{
            "status": "ok",
            "message": {
                "items": [
                    {
                        "DOI": "10.1088/1741-2552/aace8c",
                        "title": ["EEGNet: a compact convolutional neural network"],
                        "author": [
                            {"given": "Vernon J", "family": "Lawhern"},
                            {"family": "Solon"}
                        ],
                        "issued": {"date-parts": [[2018, 7, 27]]},
                        "URL": "http://dx.doi.org/10.1088/1741-2552/aace8c"
                    },
                    {
                        "title": [],
                        "issued": {"date-parts": [[null]]}
                    }
                ]
            }
        }"#;

        let records = CrossRefParser::new().parse(input).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.id, "crossref:10.1088/1741-2552/aace8c");
        assert_eq!(first.authors, vec!["Vernon J Lawhern", "Solon"]);
        assert_eq!(first.year.as_deref(), Some("2018"));
        assert_eq!(first.source, "CrossRef");
        assert_eq!(first.abstract_text, None);

        let second = &records[1];
        assert_eq!(second.id, "crossref:no-doi");
        assert_eq!(second.title, None);
        assert_eq!(second.year, None);
    }

    #[test]
    fn test_with_source_and_empty_payload() {
        let parser = CrossRefParser::new().with_source("CrossRef (bibliographic)");
        assert!(parser.parse("").unwrap().is_empty());
        let records = parser
            .parse(r#"{"message": {"items": [{"DOI": "10.1000/x"}]}}"#)
            .unwrap();
        assert_eq!(records[0].source, "CrossRef (bibliographic)");
    }

    #[test]
    fn test_malformed_payload() {
        assert!(CrossRefParser::new().parse("[1, 2").is_err());
    }
}
