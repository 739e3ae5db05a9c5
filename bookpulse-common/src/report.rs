//! Per-run failure summary
//!
//! Recoverable failures are aggregated here instead of being raised
//! individually, so one bad page or record never disrupts batch progress.
//! The report is surfaced to the operator at the end of the run.

use serde::Serialize;
use std::collections::BTreeMap;

/// Per-source collection statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceReport {
    /// Pages fetched successfully
    pub pages_fetched: usize,
    /// Raw records produced
    pub records: usize,
    /// Page fetches that failed after retries
    pub fetch_failures: usize,
    /// Pages whose structure did not match the expected format
    pub parse_failures: usize,
    /// Source unreachable; skipped entirely
    pub unavailable: bool,
}

/// Failure summary for one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Keyed by source name; BTreeMap keeps output deterministic
    pub sources: BTreeMap<String, SourceReport>,
    /// Raw records dropped for missing mandatory fields
    pub validation_drops: usize,
    /// Duplicate (title, source_id) records removed
    pub duplicates_dropped: usize,
    /// Records dropped by the configured year-range filter
    pub year_filtered: usize,
    /// Titles the sentiment method could not process (scored as no-signal)
    pub scoring_failures: usize,
    /// Run was cancelled; collected results are partial
    pub cancelled: bool,
}

impl RunReport {
    pub fn source_mut(&mut self, name: &str) -> &mut SourceReport {
        self.sources.entry(name.to_string()).or_default()
    }

    /// Total raw records across all sources
    pub fn total_records(&self) -> usize {
        self.sources.values().map(|s| s.records).sum()
    }

    pub fn total_parse_failures(&self) -> usize {
        self.sources.values().map(|s| s.parse_failures).sum()
    }

    /// Fold collection stats from another report into this one
    pub fn merge(&mut self, other: RunReport) {
        for (name, report) in other.sources {
            let entry = self.sources.entry(name).or_default();
            entry.pages_fetched += report.pages_fetched;
            entry.records += report.records;
            entry.fetch_failures += report.fetch_failures;
            entry.parse_failures += report.parse_failures;
            entry.unavailable |= report.unavailable;
        }
        self.validation_drops += other.validation_drops;
        self.duplicates_dropped += other.duplicates_dropped;
        self.year_filtered += other.year_filtered;
        self.scoring_failures += other.scoring_failures;
        self.cancelled |= other.cancelled;
    }

    /// Log the summary at the end of a run
    pub fn log_summary(&self) {
        for (name, s) in &self.sources {
            tracing::info!(
                source = %name,
                pages = s.pages_fetched,
                records = s.records,
                fetch_failures = s.fetch_failures,
                parse_failures = s.parse_failures,
                unavailable = s.unavailable,
                "Source summary"
            );
        }
        tracing::info!(
            validation_drops = self.validation_drops,
            duplicates_dropped = self.duplicates_dropped,
            year_filtered = self.year_filtered,
            scoring_failures = self.scoring_failures,
            cancelled = self.cancelled,
            "Run summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_mut_creates_entry() {
        let mut report = RunReport::default();
        report.source_mut("openlibrary").records += 5;
        report.source_mut("openlibrary").records += 3;
        assert_eq!(report.total_records(), 8);
    }

    #[test]
    fn test_merge_accumulates() {
        let mut a = RunReport::default();
        a.source_mut("goodreads").parse_failures = 1;
        a.validation_drops = 2;

        let mut b = RunReport::default();
        b.source_mut("goodreads").parse_failures = 2;
        b.source_mut("openlibrary").records = 10;
        b.cancelled = true;

        a.merge(b);
        assert_eq!(a.total_parse_failures(), 3);
        assert_eq!(a.sources["openlibrary"].records, 10);
        assert_eq!(a.validation_drops, 2);
        assert!(a.cancelled);
    }
}
