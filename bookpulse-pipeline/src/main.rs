//! bookpulse command-line entry point

use anyhow::Context;
use bookpulse_common::config::{PipelineConfig, SentimentMethod, SourceConfig, SourceKind};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bookpulse")]
#[command(about = "Collect book metadata and score title sentiment")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "BOOKPULSE_CONFIG")]
    config: Option<PathBuf>,

    /// Scored records output path (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Earliest publication year to keep
    #[arg(long)]
    year_from: Option<i32>,

    /// Latest publication year to keep
    #[arg(long)]
    year_to: Option<i32>,

    /// Sentiment method: lexicon or remote
    #[arg(long)]
    method: Option<String>,

    /// Cap on records per source
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match PipelineConfig::resolve_path(args.config.as_deref()) {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            PipelineConfig::load(&path)?
        }
        None => {
            info!("No configuration file found, using defaults");
            PipelineConfig::default()
        }
    };

    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(year_from) = args.year_from {
        config.year_from = Some(year_from);
    }
    if let Some(year_to) = args.year_to {
        config.year_to = Some(year_to);
    }
    if let Some(method) = args.method.as_deref() {
        config.sentiment_method = match method {
            "lexicon" => SentimentMethod::Lexicon,
            "remote" => SentimentMethod::Remote,
            other => anyhow::bail!("unknown sentiment method \"{}\"", other),
        };
    }
    if let Some(limit) = args.limit {
        config.max_results_per_source = limit;
    }

    if config.sources.is_empty() {
        config.sources = vec![SourceConfig {
            kind: SourceKind::OpenLibrary,
            query: Some("fiction".to_string()),
        }];
    }

    let outcome = bookpulse_pipeline::run_pipeline(config)
        .await
        .context("pipeline run failed")?;

    info!(
        records = outcome.records.len(),
        buckets = outcome.buckets,
        "Run complete"
    );
    Ok(())
}
