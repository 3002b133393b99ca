//! Saved scholarly-search result lists.
//!
//! Scraped result pages carry no identifier, so each record gets a content
//! hash id that is reproducible across runs.

use serde::Deserialize;

use crate::sources::{non_empty, parse_json};
use crate::utils::StableIds;
use crate::{Record, Result, SourceParser};

const DEFAULT_SOURCE: &str = "Google Scholar";

#[derive(Debug, Deserialize)]
struct ScholarHit {
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    url: Option<String>,
    // Byline text ("A Smith, B Jones - Journal, 2020 - publisher"); kept for the year
    meta: Option<String>,
}

/// Parser for saved scholarly-search hit lists.
#[derive(Debug, Clone)]
pub struct ScholarParser {
    source: String,
}

impl Default for ScholarParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScholarParser {
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

    fn to_record(&self, hit: ScholarHit, ids: &mut StableIds) -> Record {
        let title = non_empty(hit.title);
        let year = hit.meta.as_deref().and_then(year_from_byline);

        Record {
            id: ids.mint("gs", title.as_deref().unwrap_or_default(), &self.source),
            title,
            year,
            url: non_empty(hit.url),
            abstract_text: non_empty(hit.abstract_text),
            source: self.source.clone(),
            ..Default::default()
        }
    }
}

/// Picks the last plausible four-digit year out of a result byline.
fn year_from_byline(meta: &str) -> Option<String> {
    meta.split(|c: char| !c.is_ascii_digit())
        .filter(|token| token.len() == 4)
        .filter(|token| matches!(token.parse::<u32>(), Ok(1900..=2100)))
        .last()
        .map(str::to_string)
}

impl SourceParser for ScholarParser {
    fn parse(&self, input: &str) -> Result<Vec<Record>> {
        let hits: Option<Vec<ScholarHit>> = parse_json(input)?;
        let mut ids = StableIds::new();
        Ok(hits
            .unwrap_or_default()
            .into_iter()
            .map(|hit| self.to_record(hit, &mut ids))
            .collect())
    }
}
