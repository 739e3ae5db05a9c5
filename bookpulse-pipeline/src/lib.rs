//! bookpulse pipeline
//!
//! Collects book metadata from external sources, normalizes it into
//! canonical records, scores title sentiment, aggregates by configurable
//! dimensions, and writes both stages out as CSV.

pub mod aggregate;
pub mod collector;
pub mod normalize;
pub mod output;
pub mod sentiment;

use bookpulse_common::config::{PipelineConfig, SentimentMethod, SourceKind, GENDERIZE_KEY_ENV};
use bookpulse_common::{Error, Result, RunReport, ScoredRecord};
use chrono::Datelike;
use collector::{
    BookSource, CollectOptions, Collector, GoodreadsSource, GoogleBooksSource, OpenLibrarySource,
};
use normalize::{GenderResolver, GenreTaxonomy, ManualMapProvider, NameApiProvider, Normalizer};
use sentiment::{LexiconScorer, RemoteScorer, SentimentScorer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What a completed run produced
#[derive(Debug)]
pub struct PipelineOutcome {
    pub records: Vec<ScoredRecord>,
    pub buckets: usize,
    pub report: RunReport,
}

/// Build source instances from the configuration
fn build_sources(config: &PipelineConfig) -> Vec<Arc<dyn BookSource>> {
    let mut sources: Vec<Arc<dyn BookSource>> = Vec::new();
    let google_key = config.resolve_google_books_api_key();

    for source in &config.sources {
        let query = source.query.as_deref().unwrap_or("fiction");
        match source.kind {
            SourceKind::OpenLibrary => {
                sources.push(Arc::new(OpenLibrarySource::new(query)));
            }
            SourceKind::GoogleBooks => {
                sources.push(Arc::new(GoogleBooksSource::new(query, google_key.clone())));
            }
            SourceKind::Goodreads => {
                // One yearly popular list per year in the configured range
                let current = chrono::Utc::now().year();
                let from = config.year_from.unwrap_or(current);
                let to = config.year_to.unwrap_or(current);
                for year in from..=to {
                    sources.push(Arc::new(GoodreadsSource::new(year)));
                }
            }
        }
    }
    sources
}

fn build_gender_resolver(config: &PipelineConfig) -> Result<GenderResolver> {
    let mut providers: Vec<Box<dyn normalize::GenderProvider>> = Vec::new();

    if let Some(path) = &config.gender_map_path {
        providers.push(Box::new(ManualMapProvider::from_csv_file(path)?));
    }
    if config.enable_gender_api {
        let api_key = std::env::var(GENDERIZE_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty());
        providers.push(Box::new(NameApiProvider::new(api_key)?));
    }

    Ok(GenderResolver::new(providers))
}

fn build_scorer(config: &PipelineConfig) -> Result<Box<dyn SentimentScorer>> {
    match config.sentiment_method {
        SentimentMethod::Lexicon => Ok(Box::new(LexiconScorer::new())),
        SentimentMethod::Remote => {
            let url = config
                .remote_scorer_url
                .as_deref()
                .ok_or_else(|| Error::Config("remote_scorer_url is required".to_string()))?;
            let scorer = RemoteScorer::new(url, config.max_retries)
                .map_err(|e| Error::Scoring(e.to_string()))?;
            Ok(Box::new(scorer))
        }
    }
}

/// Run the full pipeline: collect, normalize, score, aggregate, write
pub async fn run_pipeline(config: PipelineConfig) -> Result<PipelineOutcome> {
    config.validate()?;
    let dimensions = aggregate::parse_dimensions(&config.group_by)?;

    let sources = build_sources(&config);
    if sources.is_empty() {
        return Err(Error::Config("no sources configured".to_string()));
    }

    let collector = Collector::new(CollectOptions::from(&config))
        .map_err(|e| Error::SourceUnavailable(e.to_string()))?;

    // Watchdog: on timeout the run is cancelled and partial results kept
    let watchdog = config.run_timeout_secs.map(|secs| {
        let cancel = collector.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(timeout_secs = secs, "Run timeout reached, cancelling collection");
            cancel.cancel();
        })
    });

    let (raws, mut report) = collector.collect(&sources).await;
    if let Some(watchdog) = watchdog {
        watchdog.abort();
    }

    if raws.is_empty() {
        report.log_summary();
        return Err(Error::NoData);
    }
    info!(raw_records = raws.len(), "Collection produced raw records");

    let taxonomy = match &config.taxonomy_path {
        Some(path) => GenreTaxonomy::from_toml_file(path)?,
        None => GenreTaxonomy::default(),
    };
    let resolver = build_gender_resolver(&config)?;
    let normalizer = Normalizer::new(taxonomy);

    let mut records = normalizer.normalize_all(&raws, &resolver, &mut report).await;

    // Year-range filter; unknown years are kept
    if config.year_from.is_some() || config.year_to.is_some() {
        let before = records.len();
        records.retain(|r| match r.year.known() {
            Some(year) => {
                config.year_from.map_or(true, |from| year >= from)
                    && config.year_to.map_or(true, |to| year <= to)
            }
            None => true,
        });
        report.year_filtered += before - records.len();
    }

    let scorer = build_scorer(&config)?;
    let scored = sentiment::score_all(scorer.as_ref(), records, &mut report).await;

    let buckets = aggregate::aggregate(&scored, &dimensions);

    output::write_records(&config.output_path, &scored)?;
    output::write_buckets(&config.resolved_buckets_path(), &buckets)?;

    report.log_summary();
    Ok(PipelineOutcome {
        records: scored,
        buckets: buckets.len(),
        report,
    })
}
