//! Common error types for bookpulse
//!
//! One variant per failure class. Everything except `NoData` is recoverable
//! in normal operation: the pipeline records the failure in the run report
//! and continues with the remaining sources, pages, or records.

use thiserror::Error;

/// Common result type for bookpulse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the bookpulse pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Source unreachable after retries; the whole source is skipped
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single page fetch failed; other pages are unaffected
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// Page or response structure did not match the expected format
    #[error("Parse failure: {0}")]
    Parse(String),

    /// Raw record missing mandatory fields; the record is dropped
    #[error("Validation failure: {0}")]
    Validation(String),

    /// Sentiment method could not process a title
    #[error("Scoring failure: {0}")]
    Scoring(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Terminal: every configured source came back empty
    #[error("no records collected from any configured source")]
    NoData,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
