//! PubMed `efetch` XML parser.
//!
//! # Example
//!
//! ```
//! use litreview::SourceParser;
//! use litreview::sources::PubMedXmlParser;
//!
//! let input = r#"<PubmedArticleSet><PubmedArticle>
//!   <MedlineCitation><PMID>31234567</PMID>
//!     <Article><ArticleTitle>EEG decoding with CNNs</ArticleTitle></Article>
//!   </MedlineCitation>
//! </PubmedArticle></PubmedArticleSet>"#;
//!
//! let records = PubMedXmlParser::new().parse(input).unwrap();
//! assert_eq!(records[0].id, "pubmed:31234567");
//! assert_eq!(records[0].url.as_deref(), Some("https://pubmed.ncbi.nlm.nih.gov/31234567/"));
//! ```

use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::reader::Reader;
use std::io::BufRead;

use crate::utils::clean_whitespace;
use crate::{Record, Result, ReviewError, SourceParser};

const DEFAULT_SOURCE: &str = "PubMed";

/// Parser for PubMed `efetch` XML article sets.
#[derive(Debug, Clone)]
pub struct PubMedXmlParser {
    source: String,
}

impl Default for PubMedXmlParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct AuthorName {
    last: Option<String>,
    fore: Option<String>,
}

impl PubMedXmlParser {
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

    /// Extracts text content from XML events until the closing tag is found
    fn extract_text<B: BufRead>(
        reader: &mut Reader<B>,
        buf: &mut Vec<u8>,
        closing_tag: &[u8],
    ) -> Result<String> {
        let mut text = String::new();

        loop {
            match reader.read_event_into(buf) {
                Ok(Event::Text(e)) => {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&e.unescape().map_err(|e| {
                        ReviewError::InvalidFormat(format!("Invalid XML text content: {}", e))
                    })?);
                }
                Ok(Event::CData(e)) => {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok(Event::End(e)) if e.name() == QName(closing_tag) => break,
                Ok(Event::Eof) => {
                    return Err(ReviewError::InvalidFormat(format!(
                        "Unexpected EOF while looking for closing tag '{}'",
                        String::from_utf8_lossy(closing_tag)
                    )));
                }
                Err(e) => return Err(ReviewError::from(e)),
                _ => (),
            }
            buf.clear();
        }

        Ok(clean_whitespace(&text))
    }

    /// Parses one `PubmedArticle` element; the reader is positioned just after its start tag.
    fn parse_article<B: BufRead>(&self, reader: &mut Reader<B>, buf: &mut Vec<u8>) -> Result<Record> {
        let mut pmid: Option<String> = None;
        let mut title: Option<String> = None;
        let mut abstracts: Vec<String> = Vec::new();
        let mut year: Option<String> = None;
        let mut doi: Option<String> = None;
        let mut authors: Vec<String> = Vec::new();

        let mut in_pub_date = false;
        let mut in_references = false;
        let mut author: Option<AuthorName> = None;

        loop {
            match reader.read_event_into(buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"PMID" if pmid.is_none() => {
                        pmid = Some(Self::extract_text(reader, buf, b"PMID")?);
                    }
                    b"ArticleTitle" if title.is_none() => {
                        title = Some(Self::extract_text(reader, buf, b"ArticleTitle")?);
                    }
                    b"AbstractText" => {
                        abstracts.push(Self::extract_text(reader, buf, b"AbstractText")?);
                    }
                    b"PubDate" => in_pub_date = true,
                    b"Year" if in_pub_date && year.is_none() => {
                        year = Some(Self::extract_text(reader, buf, b"Year")?);
                    }
                    b"MedlineDate" if in_pub_date && year.is_none() => {
                        // Free-form ranges such as "2019 Dec-2020 Jan"
                        let text = Self::extract_text(reader, buf, b"MedlineDate")?;
                        year = text.get(..4).map(str::to_string);
                    }
                    b"Author" => author = Some(AuthorName::default()),
                    b"LastName" if author.is_some() => {
                        let text = Self::extract_text(reader, buf, b"LastName")?;
                        if let Some(a) = author.as_mut() {
                            a.last = Some(text);
                        }
                    }
                    b"ForeName" if author.is_some() => {
                        let text = Self::extract_text(reader, buf, b"ForeName")?;
                        if let Some(a) = author.as_mut() {
                            a.fore = Some(text);
                        }
                    }
                    b"ReferenceList" => in_references = true,
                    b"ArticleId" if !in_references && doi.is_none() => {
                        let mut is_doi = false;
                        for attr in e.attributes() {
                            let attr = attr?;
                            if attr.key.as_ref() == b"IdType" {
                                is_doi = attr.unescape_value()? == "doi";
                            }
                        }
                        if is_doi {
                            doi = Some(Self::extract_text(reader, buf, b"ArticleId")?);
                        }
                    }
                    _ => (),
                },
                Ok(Event::End(ref e)) => match e.name().as_ref() {
                    b"PubmedArticle" => break,
                    b"PubDate" => in_pub_date = false,
                    b"ReferenceList" => in_references = false,
                    b"Author" => {
                        if let Some(AuthorName {
                            last: Some(last),
                            fore: Some(fore),
                        }) = author.take()
                        {
                            authors.push(format!("{} {}", fore, last));
                        }
                    }
                    _ => (),
                },
                Ok(Event::Eof) => {
                    return Err(ReviewError::InvalidFormat(
                        "Unexpected EOF inside PubmedArticle".into(),
                    ));
                }
                Err(e) => return Err(ReviewError::from(e)),
                _ => (),
            }
            buf.clear();
        }

        let pmid = pmid
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ReviewError::MissingField("PMID".into()))?;
        let abstract_text = abstracts.join(" ");

        Ok(Record {
            id: format!("pubmed:{}", pmid),
            title: title.filter(|t| !t.is_empty()),
            authors,
            year,
            doi: doi.filter(|d| !d.is_empty()),
            url: Some(format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid)),
            abstract_text: (!abstract_text.trim().is_empty()).then_some(abstract_text),
            source: self.source.clone(),
            ..Default::default()
        })
    }
}

impl SourceParser for PubMedXmlParser {
    fn parse(&self, input: &str) -> Result<Vec<Record>> {
        if input.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut records = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.name() == QName(b"PubmedArticle") => {
                    records.push(self.parse_article(&mut reader, &mut buf)?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(ReviewError::from(e)),
                _ => (),
            }
            buf.clear();
        }

        Ok(records)
    }
}
