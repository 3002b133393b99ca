//! GitHub repository search response parser.

use serde::Deserialize;

use crate::sources::{non_empty, parse_json, scalar_to_string};
use crate::{Record, Result, SourceParser};

const DEFAULT_SOURCE: &str = "GitHub";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    #[serde(default)]
    id: serde_json::Value,
    name: Option<String>,
    owner: Option<Owner>,
    description: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

/// Parser for GitHub repository search responses.
///
/// Repositories have no year or DOI; the owner login stands in as the author.
#[derive(Debug, Clone)]
pub struct GitHubParser {
    source: String,
}

impl Default for GitHubParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubParser {
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
}

impl SourceParser for GitHubParser {
    fn parse(&self, input: &str) -> Result<Vec<Record>> {
        let response: Option<SearchResponse> = parse_json(input)?;
        Ok(response
            .map(|r| r.items)
            .unwrap_or_default()
            .into_iter()
            .map(|repo| Record {
                id: format!("github:{}", scalar_to_string(&repo.id).unwrap_or_default()),
                title: non_empty(repo.name),
                authors: repo.owner.map(|o| vec![o.login]).unwrap_or_default(),
                abstract_text: non_empty(repo.description),
                url: non_empty(repo.html_url),
                source: self.source.clone(),
                ..Default::default()
            })
            .collect())
    }
}
