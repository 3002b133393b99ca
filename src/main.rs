use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use litreview::{Pipeline, PipelineConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Deduplicate and screen harvested literature search results
#[derive(Parser, Debug)]
#[command(name = "litreview")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deduplicate and screen harvested literature search results", long_about = None)]
struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(long, short)]
    config: PathBuf,

    /// Stop after title/abstract screening; no full text is assessed
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("litreview={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = PipelineConfig::from_path(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    let summary = Pipeline::new(config)
        .run(cli.dry_run)
        .context("pipeline run failed")?;

    if !cli.quiet {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["litreview", "--config", "review.toml"]);
        assert_eq!(cli.config, PathBuf::from("review.toml"));
        assert!(!cli.dry_run);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["litreview", "-c", "r.toml", "--dry-run", "-vv"]);
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_config_is_required() {
        assert!(Cli::try_parse_from(["litreview"]).is_err());
    }
}
