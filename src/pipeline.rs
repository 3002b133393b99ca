//! End-to-end review run: load, deduplicate, screen, export.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use litreview::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::from_path(Path::new("review.toml")).unwrap();
//! let summary = Pipeline::new(config).run(false).unwrap();
//! println!("{} records included", summary.included);
//! ```

use std::fs;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{PipelineConfig, SourceInput};
use crate::dedupe::Deduplicator;
use crate::export::{PrismaReport, write_bibtex_file, write_csv_file, write_prisma_json_file};
use crate::fulltext::{FullText, load_full_text};
use crate::screen::{ScreenedRecord, screen_all};
use crate::{Record, Result, ReviewError};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub records_by_source: Vec<(String, usize)>,
    pub total_identified: usize,
    pub canonical_count: usize,
    pub duplicates_removed: usize,
    pub human_review_pairs: usize,
    pub title_abstract_included: usize,
    pub full_text_assessed: usize,
    /// Records surviving every stage; zero on a dry run
    pub included: usize,
    pub dry_run: bool,
}

/// Orchestrates one review run from a [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parses every configured source file, in configuration order.
    ///
    /// Returns the merged records and the per-source counts.
    ///
    /// # Errors
    ///
    /// Fails on the first source file that cannot be read or parsed.
    pub fn load_sources(&self) -> Result<(Vec<Record>, Vec<(String, usize)>)> {
        let mut records = Vec::new();
        let mut counts = Vec::with_capacity(self.config.sources.len());

        for input in &self.config.sources {
            let loaded = load_source(input)?;
            info!(source = %input.name, count = loaded.len(), "loaded source");
            counts.push((input.name.clone(), loaded.len()));
            records.extend(loaded);
        }

        Ok((records, counts))
    }

    /// Runs the review. A dry run stops after title/abstract screening and
    /// writes only the identification counts.
    ///
    /// # Errors
    ///
    /// Returns an error when a source cannot be loaded or an artifact cannot
    /// be written.
    pub fn run(&self, dry_run: bool) -> Result<PipelineSummary> {
        let output = &self.config.output;
        fs::create_dir_all(&output.artifacts_dir)?;

        let (records, records_by_source) = self.load_sources()?;
        let identification = PrismaReport::identification(records_by_source.clone());
        info!(total = identification.total_identified, "records identified");

        info!("deduplicating records");
        let deduplicator = Deduplicator::new().with_config(self.config.dedupe.clone());
        let (canonical, duplicates) = deduplicator.dedupe(records);

        write_prisma_json_file(&output.prisma_json, &identification)?;

        info!("title/abstract screening");
        let mut screened = screen_all(
            canonical,
            &self.config.criteria(),
            self.config.screening.run_in_parallel,
        );

        let mut summary = PipelineSummary {
            total_identified: identification.total_identified,
            records_by_source,
            canonical_count: screened.len(),
            duplicates_removed: duplicates.removed_count(),
            human_review_pairs: duplicates.human_review.len(),
            title_abstract_included: screened
                .iter()
                .filter(|s| s.title_abstract.is_included())
                .count(),
            dry_run,
            ..Default::default()
        };
        info!(count = summary.title_abstract_included, "full-text to assess");

        if dry_run {
            info!("dry run finished, no full text assessed");
            return Ok(summary);
        }

        info!("full-text screening");
        let fulltext_dir = output.fulltext_dir();
        for entry in screened
            .iter_mut()
            .filter(|s| s.title_abstract.is_included())
        {
            let full_text = load_full_text(&fulltext_dir, &entry.record).unwrap_or_else(|e| {
                warn!(id = %entry.record.id, error = %e, "full text unreadable, screening without it");
                FullText {
                    pdf_text: None,
                    pdf_url: entry.record.pdf_url.clone(),
                }
            });
            entry.apply_full_text(full_text);
        }
        summary.full_text_assessed = screened.iter().filter(|s| s.full_text.is_some()).count();

        let included: Vec<&ScreenedRecord> = screened
            .iter()
            .filter(|s| s.full_text.is_some() && s.is_included())
            .collect();
        summary.included = included.len();

        info!("exporting artifacts");
        write_csv_file(&output.csv, &screened)?;
        write_bibtex_file(&output.bib, included.iter().map(|s| &s.record))?;
        let canonical_count = screened.len();
        let report = identification
            .with_duplicates(duplicates, canonical_count)
            .with_screening(&screened);
        write_prisma_json_file(&output.prisma_json, &report)?;

        info!(
            identified = summary.total_identified,
            canonical = summary.canonical_count,
            included = summary.included,
            "pipeline finished"
        );
        Ok(summary)
    }
}

fn load_source(input: &SourceInput) -> Result<Vec<Record>> {
    let content = fs::read_to_string(&input.path).map_err(|e| {
        ReviewError::Io(std::io::Error::new(
            e.kind(),
            format!("{} ({}): {}", input.name, input.path.display(), e),
        ))
    })?;
    input
        .format
        .parser(&input.name)?
        .parse(&content)
        .map_err(|e| match e {
            ReviewError::InvalidFormat(msg) => {
                ReviewError::InvalidFormat(format!("{}: {}", input.name, msg))
            }
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputConfig;
    use crate::sources::SourceFormat;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn config_in(dir: &Path, sources: Vec<SourceInput>) -> PipelineConfig {
        let artifacts_dir = dir.join("artifacts");
        PipelineConfig {
            sources,
            output: OutputConfig {
                csv: artifacts_dir.join("screening.csv"),
                prisma_json: artifacts_dir.join("prisma.json"),
                bib: artifacts_dir.join("included.bib"),
                artifacts_dir,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_load_sources_keeps_order_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "Title\nFirst\nSecond").unwrap();
        fs::write(dir.path().join("b.json"), r#"{"items": [{"id": 1, "name": "repo"}]}"#).unwrap();

        let pipeline = Pipeline::new(config_in(
            dir.path(),
            vec![
                SourceInput {
                    name: "Manual".to_string(),
                    format: SourceFormat::Csv,
                    path: dir.path().join("a.csv"),
                },
                SourceInput {
                    name: "GitHub".to_string(),
                    format: SourceFormat::GitHubJson,
                    path: dir.path().join("b.json"),
                },
            ],
        ));

        let (records, counts) = pipeline.load_sources().unwrap();
        assert_eq!(
            counts,
            vec![("Manual".to_string(), 2), ("GitHub".to_string(), 1)]
        );
        assert_eq!(records[0].source, "Manual");
        assert_eq!(records[2].source, "GitHub");
    }

    #[test]
    fn test_missing_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(config_in(
            dir.path(),
            vec![SourceInput {
                name: "CrossRef".to_string(),
                format: SourceFormat::CrossRefJson,
                path: dir.path().join("missing.json"),
            }],
        ));
        let err = pipeline.run(true).unwrap_err();
        assert!(err.to_string().contains("CrossRef"));
    }

    #[test]
    fn test_malformed_source_names_the_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ieee.json"), "{broken").unwrap();
        let pipeline = Pipeline::new(config_in(
            dir.path(),
            vec![SourceInput {
                name: "IEEE Xplore".to_string(),
                format: SourceFormat::IeeeJson,
                path: dir.path().join("ieee.json"),
            }],
        ));
        let err = pipeline.load_sources().unwrap_err();
        assert!(matches!(err, ReviewError::InvalidFormat(ref msg) if msg.starts_with("IEEE Xplore:")));
    }

    #[test]
    fn test_dry_run_writes_identification_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.csv"),
            "Title,Year\nEEG classification with CNN,2020\nEEG classification with CNN,2020",
        )
        .unwrap();
        let config = config_in(
            dir.path(),
            vec![SourceInput {
                name: "Manual".to_string(),
                format: SourceFormat::Csv,
                path: dir.path().join("a.csv"),
            }],
        );
        let summary = Pipeline::new(config.clone()).run(true).unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.total_identified, 2);
        assert_eq!(summary.canonical_count, 1);
        assert_eq!(summary.duplicates_removed, 1);
        assert_eq!(summary.title_abstract_included, 1);
        assert_eq!(summary.included, 0);
        assert!(config.output.prisma_json.exists());
        assert!(!config.output.csv.exists());
        assert!(!config.output.bib.exists());
    }
}
