//! IEEE Xplore article search response parser.

use serde::Deserialize;

use crate::sources::{non_empty, parse_json, scalar_to_string};
use crate::{Record, Result, SourceParser};

const DEFAULT_SOURCE: &str = "IEEE Xplore";

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Default, Deserialize)]
struct Article {
    #[serde(default)]
    article_number: serde_json::Value,
    title: Option<String>,
    authors: Option<ArticleAuthors>,
    #[serde(default)]
    publication_year: serde_json::Value,
    doi: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    html_url: Option<String>,
    pdf_url: Option<String>,
}

// The v1 API nests the list under "authors"; older dumps carry a flat list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArticleAuthors {
    Nested { authors: Vec<ArticleAuthor> },
    Flat(Vec<ArticleAuthor>),
}

#[derive(Debug, Deserialize)]
struct ArticleAuthor {
    full_name: Option<String>,
    name: Option<String>,
}

impl ArticleAuthors {
    fn into_names(self) -> Vec<String> {
        let list = match self {
            ArticleAuthors::Nested { authors } => authors,
            ArticleAuthors::Flat(authors) => authors,
        };
        list.into_iter()
            .filter_map(|a| non_empty(a.full_name.or(a.name)))
            .collect()
    }
}

/// Parser for IEEE Xplore search responses.
#[derive(Debug, Clone)]
pub struct IeeeParser {
    source: String,
}

impl Default for IeeeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl IeeeParser {
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

    fn to_record(&self, article: Article) -> Record {
        let article_number = scalar_to_string(&article.article_number).unwrap_or_default();
        let html_url = non_empty(article.html_url);
        let pdf_url = non_empty(article.pdf_url);

        Record {
            id: format!("ieee:{}", article_number),
            title: non_empty(article.title),
            authors: article
                .authors
                .map(ArticleAuthors::into_names)
                .unwrap_or_default(),
            year: scalar_to_string(&article.publication_year),
            doi: non_empty(article.doi),
            url: html_url.or_else(|| pdf_url.clone()),
            abstract_text: non_empty(article.abstract_text),
            source: self.source.clone(),
            pdf_url,
            ..Default::default()
        }
    }
}

impl SourceParser for IeeeParser {
    fn parse(&self, input: &str) -> Result<Vec<Record>> {
        let response: Option<SearchResponse> = parse_json(input)?;
        Ok(response
            .map(|r| r.articles)
            .unwrap_or_default()
            .into_iter()
            .map(|article| self.to_record(article))
            .collect())
    }
}
