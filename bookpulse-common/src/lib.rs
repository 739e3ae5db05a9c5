//! bookpulse-common - Shared types for the bookpulse pipeline
//!
//! Record schema, error taxonomy, configuration model, and the per-run
//! failure report used by every pipeline stage.

pub mod config;
pub mod error;
pub mod report;
pub mod types;

pub use error::{Error, Result};
pub use report::{RunReport, SourceReport};
pub use types::{AggregateBucket, BookRecord, Gender, RawRecord, ScoredRecord, Sentiment, Year};
