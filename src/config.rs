//! Pipeline configuration loaded from TOML.
//!
//! # Configuration File Format
//!
//! ```toml
//! [search]
//! date_from = "2015-01-01"
//! date_to = "2024-12-31"
//!
//! [search.queries]
//! pubmed = "(EEG OR electroencephalography) AND (deep learning) AND classification"
//! ieee = "EEG deep learning classification"
//!
//! [dedupe]
//! fuzzy_threshold_exact = 0.92
//! fuzzy_threshold_candidate = 0.85
//! human_review_threshold_low = 0.80
//! similarity = "token_set"
//!
//! [screening]
//! run_in_parallel = true
//! default_language = "English"
//!
//! [[sources]]
//! name = "PubMed"
//! format = "pubmed_xml"
//! path = "harvest/pubmed.xml"
//!
//! [[sources]]
//! name = "CrossRef"
//! format = "crossref_json"
//! path = "harvest/crossref.json"
//!
//! [output]
//! artifacts_dir = "artifacts"
//! csv = "artifacts/screening.csv"
//! prisma_json = "artifacts/prisma.json"
//! bib = "artifacts/included.bib"
//! ```
//!
//! Relative paths in a file loaded with [`PipelineConfig::from_path`] are
//! resolved against the directory containing that file.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dedupe::DedupeConfig;
use crate::screen::ScreeningCriteria;
use crate::sources::SourceFormat;
use crate::utils::year_prefix;
use crate::{Result, ReviewError};

/// Complete configuration of a review run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub dedupe: DedupeConfig,

    #[serde(default)]
    pub screening: ScreeningConfig,

    /// Harvested payloads to load, in the order they are counted and merged
    #[serde(default)]
    pub sources: Vec<SourceInput>,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Publication window and the queries that produced the harvest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// ISO date; only the year is used for screening
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    /// Per-source query strings, kept for provenance
    #[serde(default)]
    pub queries: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub run_in_parallel: bool,
    pub default_language: String,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            run_in_parallel: false,
            default_language: "English".to_string(),
        }
    }
}

/// One harvested payload file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInput {
    /// Source name written into every record loaded from this file
    pub name: String,
    pub format: SourceFormat,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub artifacts_dir: PathBuf,
    pub csv: PathBuf,
    pub prisma_json: PathBuf,
    pub bib: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let artifacts_dir = PathBuf::from("artifacts");
        Self {
            csv: artifacts_dir.join("screening.csv"),
            prisma_json: artifacts_dir.join("prisma.json"),
            bib: artifacts_dir.join("included.bib"),
            artifacts_dir,
        }
    }
}

impl OutputConfig {
    /// Directory searched for pre-extracted text and PDFs.
    #[must_use]
    pub fn fulltext_dir(&self) -> PathBuf {
        self.artifacts_dir.join("fulltext")
    }
}

impl PipelineConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Config` for malformed TOML or invalid values.
    ///
    /// # Examples
    ///
    /// ```
    /// use litreview::PipelineConfig;
    ///
    /// let config = PipelineConfig::from_toml_str(r#"
    ///     [search]
    ///     date_from = "2015-01-01"
    ///
    ///     [dedupe]
    ///     fuzzy_threshold_exact = 0.95
    /// "#).unwrap();
    /// assert_eq!(config.dedupe.fuzzy_threshold_exact, 0.95);
    /// assert_eq!(config.dedupe.fuzzy_threshold_candidate, 0.85);
    /// assert_eq!(config.criteria().date_from, Some(2015));
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file, resolving relative paths against its directory.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Io` when the file cannot be read and
    /// `ReviewError::Config` when it is invalid.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Checks dedupe thresholds, the date window and the source list.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.dedupe.validate()?;

        let bound = |name: &str, value: &Option<String>| -> Result<Option<i32>> {
            match value.as_deref() {
                None => Ok(None),
                Some(v) => year_prefix(v).map(Some).ok_or_else(|| {
                    ReviewError::Config(format!("search.{} is not a date: {:?}", name, v))
                }),
            }
        };
        let from = bound("date_from", &self.search.date_from)?;
        let to = bound("date_to", &self.search.date_to)?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ReviewError::Config(format!(
                    "search.date_from ({}) is after search.date_to ({})",
                    from, to
                )));
            }
        }

        if let Some(source) = self.sources.iter().find(|s| s.name.trim().is_empty()) {
            return Err(ReviewError::Config(format!(
                "source at {} has an empty name",
                source.path.display()
            )));
        }

        let mut names = HashSet::new();
        if let Some(source) = self.sources.iter().find(|s| !names.insert(s.name.trim())) {
            return Err(ReviewError::Config(format!(
                "source name {:?} is used more than once",
                source.name
            )));
        }
        Ok(())
    }

    /// Screening bounds derived from the search window.
    #[must_use]
    pub fn criteria(&self) -> ScreeningCriteria {
        ScreeningCriteria {
            date_from: self.search.date_from.as_deref().and_then(year_prefix),
            date_to: self.search.date_to.as_deref().and_then(year_prefix),
            default_language: self.screening.default_language.clone(),
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        for source in &mut self.sources {
            rebase(&mut source.path);
        }
        rebase(&mut self.output.artifacts_dir);
        rebase(&mut self.output.csv);
        rebase(&mut self.output.prisma_json);
        rebase(&mut self.output.bib);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedupe::SimilarityMetric;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.dedupe.fuzzy_threshold_exact, 0.92);
        assert_eq!(config.screening.default_language, "English");
        assert_eq!(config.output.fulltext_dir(), PathBuf::from("artifacts/fulltext"));
    }

    #[test]
    fn test_full_file() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [search]
            date_from = "2015-01-01"
            date_to = "2024-12-31"
            [search.queries]
            pubmed = "EEG AND deep learning"

            [dedupe]
            similarity = "jaro_winkler"

            [screening]
            run_in_parallel = true

            [[sources]]
            name = "PubMed"
            format = "pubmed_xml"
            path = "pubmed.xml"

            [[sources]]
            name = "Manual"
            format = "csv"
            path = "manual.csv"

            [output]
            artifacts_dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(config.dedupe.similarity, SimilarityMetric::JaroWinkler);
        assert!(config.screening.run_in_parallel);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].format, SourceFormat::Csv);
        assert_eq!(config.output.artifacts_dir, PathBuf::from("out"));
        assert_eq!(config.output.csv, PathBuf::from("artifacts/screening.csv"));
        assert_eq!(
            config.criteria(),
            ScreeningCriteria::new(Some(2015), Some(2024))
        );
    }

    #[test]
    fn test_invalid_thresholds() {
        let err = PipelineConfig::from_toml_str(
            "[dedupe]\nfuzzy_threshold_exact = 0.5\nfuzzy_threshold_candidate = 0.85",
        )
        .unwrap_err();
        assert!(matches!(err, ReviewError::Config(_)));
    }

    #[test]
    fn test_invalid_dates() {
        assert!(PipelineConfig::from_toml_str("[search]\ndate_from = \"soon\"").is_err());
        assert!(
            PipelineConfig::from_toml_str("[search]\ndate_from = \"2024\"\ndate_to = \"2015\"")
                .is_err()
        );
    }

    #[test]
    fn test_duplicate_source_names() {
        let err = PipelineConfig::from_toml_str(
            "[[sources]]\nname = \"PubMed\"\nformat = \"pubmed_xml\"\npath = \"a.xml\"\n\
             [[sources]]\nname = \" PubMed\"\nformat = \"pubmed_xml\"\npath = \"b.xml\"",
        )
        .unwrap_err();
        assert!(matches!(err, ReviewError::Config(ref msg) if msg.contains("PubMed")));
    }

    #[test]
    fn test_unknown_source_format() {
        let err = PipelineConfig::from_toml_str(
            "[[sources]]\nname = \"X\"\nformat = \"ris\"\npath = \"x.ris\"",
        )
        .unwrap_err();
        assert!(matches!(err, ReviewError::Config(_)));
    }

    #[test]
    fn test_from_path_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.toml");
        fs::write(
            &path,
            "[[sources]]\nname = \"CrossRef\"\nformat = \"crossref_json\"\npath = \"crossref.json\"",
        )
        .unwrap();

        let config = PipelineConfig::from_path(&path).unwrap();
        assert_eq!(config.sources[0].path, dir.path().join("crossref.json"));
        assert_eq!(config.output.artifacts_dir, dir.path().join("artifacts"));
    }

    #[test]
    fn test_missing_file() {
        let err = PipelineConfig::from_path(Path::new("/nonexistent/review.toml")).unwrap_err();
        assert!(matches!(err, ReviewError::Io(_)));
    }
}
