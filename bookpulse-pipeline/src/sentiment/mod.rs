//! Title sentiment scoring
//!
//! A scorer is a capability interface; the embedded lexicon scorer and the
//! remote model scorer implement the same contract. Per-record failures
//! degrade to `Sentiment::NoSignal` and a report counter, never a run abort.

pub mod lexicon;
pub mod remote;

pub use lexicon::LexiconScorer;
pub use remote::RemoteScorer;

use async_trait::async_trait;
use bookpulse_common::{BookRecord, RunReport, ScoredRecord, Sentiment};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Scoring request failed: {0}")]
    Request(String),
    #[error("Scoring response unparseable: {0}")]
    Response(String),
}

/// A title sentiment scoring capability
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    /// Method tag recorded on every score this scorer produces
    fn method(&self) -> &'static str;

    /// Score one title; Ok(NoSignal) means the title carries no signal,
    /// Err means the scorer itself failed on this record.
    async fn score_title(&self, title: &str, language: &str) -> Result<Sentiment, ScoreError>;
}

/// Score a batch of records, isolating per-record failures
pub async fn score_all(
    scorer: &dyn SentimentScorer,
    records: Vec<BookRecord>,
    report: &mut RunReport,
) -> Vec<ScoredRecord> {
    let total = records.len();
    let mut scored = Vec::with_capacity(total);

    for record in records {
        let sentiment = match scorer.score_title(&record.title, &record.language).await {
            Ok(sentiment) => sentiment,
            Err(e) => {
                warn!(title = %record.title, error = %e, "Scoring failed, recording no signal");
                report.scoring_failures += 1;
                Sentiment::NoSignal
            }
        };
        scored.push(ScoredRecord::new(record, sentiment));
    }

    let with_signal = scored.iter().filter(|r| r.sentiment_score.is_some()).count();
    info!(
        method = scorer.method(),
        records = total,
        with_signal,
        "Sentiment scoring complete"
    );
    scored
}
