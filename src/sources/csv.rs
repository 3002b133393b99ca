//! CSV exports with configurable column headers.
//!
//! Spreadsheet exports from reference managers and manual searches rarely
//! agree on column names, so headers are mapped onto record fields through
//! case-insensitive aliases.
//!
//! # Example
//!
//! ```
//! use litreview::SourceParser;
//! use litreview::sources::CsvParser;
//!
//! let input = "Title,Authors,Year,DOI\nEEG decoding,Smith J; Doe A,2021,10.1000/abc";
//! let records = CsvParser::new().parse(input).unwrap();
//! assert_eq!(records[0].authors, vec!["Smith J", "Doe A"]);
//! assert_eq!(records[0].doi.as_deref(), Some("10.1000/abc"));
//! ```

use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;

use crate::utils::{StableIds, format_doi};
use crate::{Record, Result, ReviewError, SourceParser};

const DEFAULT_SOURCE: &str = "CSV";

/// Default header mappings for common CSV column names
const DEFAULT_HEADERS: &[(&str, &[&str])] = &[
    ("id", &["id", "record id", "record_id"]),
    ("title", &["title", "article title", "publication title"]),
    ("authors", &["author", "authors", "creator", "creators"]),
    ("year", &["year", "publication year", "pub year"]),
    ("doi", &["doi", "digital object identifier"]),
    ("url", &["url", "link", "web link"]),
    ("abstract", &["abstract", "summary"]),
    ("source", &["source", "database"]),
    ("language", &["language", "lang"]),
];

/// Configuration for CSV parsing with custom header mappings.
///
/// # Examples
///
/// ```
/// use litreview::sources::CsvConfig;
///
/// let mut config = CsvConfig::new();
/// config.set_header_mapping("title", vec!["Article Name".to_string()]);
/// config.set_delimiter(b';');
/// ```
#[derive(Debug, Clone, Default)]
pub struct CsvConfig {
    header_map: HashMap<String, Vec<String>>,
    delimiter: u8,
    has_header: bool,
}

impl CsvConfig {
    /// Creates a new CSV configuration with default settings
    #[must_use]
    pub fn new() -> Self {
        let mut config = Self {
            header_map: HashMap::new(),
            delimiter: b',',
            has_header: true,
        };
        for (field, aliases) in DEFAULT_HEADERS {
            config.header_map.insert(
                field.to_string(),
                aliases.iter().map(|s| s.to_string()).collect(),
            );
        }
        config
    }

    /// Replaces the aliases recognised for `field`
    pub fn set_header_mapping(&mut self, field: &str, aliases: Vec<String>) -> &mut Self {
        self.header_map.insert(field.to_string(), aliases);
        self
    }

    pub fn set_delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.delimiter = delimiter;
        self
    }

    /// Without headers, columns are taken in the order
    /// id, title, authors, year, doi, url, abstract, source, language.
    pub fn set_has_header(&mut self, has_header: bool) -> &mut Self {
        self.has_header = has_header;
        self
    }

    fn field_for_header(&self, header: &str) -> Option<&str> {
        let header = header.trim().to_lowercase();
        self.header_map
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| a.to_lowercase() == header))
            .map(|(field, _)| field.as_str())
    }
}

/// Parser for CSV-formatted search exports.
#[derive(Debug, Clone)]
pub struct CsvParser {
    config: CsvConfig,
    source: String,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CsvConfig::new(),
            source: DEFAULT_SOURCE.to_string(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the source name used for rows without a `source` column value.
    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    fn parse_record(
        &self,
        fields: &[Option<&str>],
        row: &StringRecord,
        ids: &mut StableIds,
    ) -> Record {
        let mut record = Record {
            source: self.source.clone(),
            ..Default::default()
        };

        for (field, value) in fields.iter().zip(row.iter()) {
            let Some(field) = field else { continue };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match *field {
                "id" => record.id = value.to_string(),
                "title" => record.title = Some(value.to_string()),
                "authors" => record.authors.extend(
                    value
                        .split(';')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from),
                ),
                "year" => record.year = Some(value.to_string()),
                "doi" => record.doi = format_doi(value),
                "url" => record.url = Some(value.to_string()),
                "abstract" => record.abstract_text = Some(value.to_string()),
                "source" => record.source = value.to_string(),
                "language" => record.language = Some(value.to_string()),
                _ => {}
            }
        }

        if record.id.is_empty() {
            record.id = ids.mint(
                "csv",
                record.title.as_deref().unwrap_or_default(),
                &record.source,
            );
        }

        record
    }
}

impl SourceParser for CsvParser {
    fn parse(&self, input: &str) -> Result<Vec<Record>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(self.config.has_header)
            .flexible(true)
            .from_reader(input.as_bytes());

        let headers: Vec<String> = if self.config.has_header {
            reader
                .headers()
                .map_err(|e| ReviewError::InvalidFormat(e.to_string()))?
                .iter()
                .map(String::from)
                .collect()
        } else {
            DEFAULT_HEADERS
                .iter()
                .map(|(field, _)| field.to_string())
                .collect()
        };

        let fields: Vec<Option<&str>> = headers
            .iter()
            .map(|header| self.config.field_for_header(header))
            .collect();

        let mut ids = StableIds::new();
        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(|e| ReviewError::InvalidFormat(e.to_string()))?;
            records.push(self.parse_record(&fields, &row, &mut ids));
        }

        Ok(records)
    }
}
