//! CSV output
//!
//! Scored records and aggregate buckets each land in one CSV file. The
//! record file doubles as the hand-off format between runs, so reading it
//! back must reproduce the records exactly.

use crate::aggregate::{format_key, BucketKey};
use bookpulse_common::{AggregateBucket, Error, Result, ScoredRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }
    }
    Ok(())
}

/// Write scored records as CSV, creating parent directories as needed
pub fn write_records(path: &Path, records: &[ScoredRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(Error::Io)?;
    info!(path = %path.display(), records = records.len(), "Wrote scored records");
    Ok(())
}

/// Read scored records back from CSV
pub fn read_records(path: &Path) -> Result<Vec<ScoredRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// One aggregate bucket as a CSV row
#[derive(Debug, Serialize)]
struct BucketRow {
    group: String,
    scored: usize,
    excluded: usize,
    mean: Option<f64>,
    variance: Option<f64>,
    min: Option<f64>,
    max: Option<f64>,
}

/// Write aggregate buckets as CSV
pub fn write_buckets(path: &Path, buckets: &BTreeMap<BucketKey, AggregateBucket>) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for (key, bucket) in buckets {
        writer.serialize(BucketRow {
            group: format_key(key),
            scored: bucket.scored,
            excluded: bucket.excluded,
            mean: bucket.mean,
            variance: bucket.variance,
            min: bucket.min,
            max: bucket.max,
        })?;
    }
    writer.flush().map_err(Error::Io)?;
    info!(path = %path.display(), buckets = buckets.len(), "Wrote aggregate buckets");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookpulse_common::types::Year;
    use bookpulse_common::{BookRecord, Gender, Sentiment};

    fn sample_records() -> Vec<ScoredRecord> {
        let with_score = BookRecord {
            title: "Bright Morning".to_string(),
            author: "B. Writer".to_string(),
            author_gender: Gender::Female,
            gender_source: "manual".to_string(),
            year: Year::Known(2021),
            genres: vec!["romance".to_string(), "fantasy".to_string()],
            country: "France".to_string(),
            language: "fr".to_string(),
            source_id: "googlebooks:abc123".to_string(),
            rating: Some(4.1),
            ratings_count: 1200,
        };
        let no_signal = BookRecord {
            title: "???".to_string(),
            author: "".to_string(),
            author_gender: Gender::Unknown,
            gender_source: "none".to_string(),
            year: Year::Unknown,
            genres: vec!["other".to_string()],
            country: "unknown".to_string(),
            language: "en".to_string(),
            source_id: "openlibrary:OL9W".to_string(),
            rating: None,
            ratings_count: 0,
        };
        vec![
            ScoredRecord::new(with_score, Sentiment::scored(0.5, "lexicon")),
            ScoredRecord::new(no_signal, Sentiment::NoSignal),
        ]
    }

    #[test]
    fn test_records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/scored.csv");

        let records = sample_records();
        write_records(&path, &records).unwrap();
        let back = read_records(&path).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_buckets_csv_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buckets.csv");

        let mut buckets = BTreeMap::new();
        buckets.insert(
            vec![("gender".to_string(), "female".to_string())],
            AggregateBucket {
                scored: 2,
                excluded: 1,
                mean: Some(0.25),
                variance: Some(0.0625),
                min: Some(0.0),
                max: Some(0.5),
            },
        );
        write_buckets(&path, &buckets).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "group,scored,excluded,mean,variance,min,max"
        );
        assert_eq!(lines.next().unwrap(), "gender=female,2,1,0.25,0.0625,0.0,0.5");
    }
}
