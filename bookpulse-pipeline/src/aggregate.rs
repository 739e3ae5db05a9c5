//! Bucketed aggregation over scored records
//!
//! Records group by configurable dimensions (country, genre, gender, year,
//! source) into buckets keyed by (dimension, value) pairs. Statistics are
//! single-pass Welford over scored records; no-signal records are counted in
//! the bucket but excluded from mean/variance. BTreeMap keys and a sorted
//! input pass keep output order deterministic across runs.

use bookpulse_common::{AggregateBucket, Error, Result, ScoredRecord};
use std::collections::BTreeMap;

/// A grouping dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Country,
    Genre,
    Gender,
    Year,
    Source,
}

impl Dimension {
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Country => "country",
            Dimension::Genre => "genre",
            Dimension::Gender => "gender",
            Dimension::Year => "year",
            Dimension::Source => "source",
        }
    }

    fn value(&self, record: &ScoredRecord) -> String {
        match self {
            Dimension::Country => record.country.clone(),
            Dimension::Genre => record.primary_genre().to_string(),
            Dimension::Gender => record.author_gender.as_str().to_string(),
            Dimension::Year => record.year.to_string(),
            Dimension::Source => record
                .source_id
                .split(':')
                .next()
                .unwrap_or("unknown")
                .to_string(),
        }
    }
}

/// Parse configured dimension names, rejecting unknown or duplicate entries
pub fn parse_dimensions(names: &[String]) -> Result<Vec<Dimension>> {
    let mut dimensions = Vec::with_capacity(names.len());
    for name in names {
        let dimension = match name.trim().to_lowercase().as_str() {
            "country" => Dimension::Country,
            "genre" => Dimension::Genre,
            "gender" => Dimension::Gender,
            "year" => Dimension::Year,
            "source" => Dimension::Source,
            other => {
                return Err(Error::Config(format!(
                    "unknown group_by dimension \"{}\"",
                    other
                )))
            }
        };
        if dimensions.contains(&dimension) {
            return Err(Error::Config(format!(
                "duplicate group_by dimension \"{}\"",
                dimension.name()
            )));
        }
        dimensions.push(dimension);
    }
    Ok(dimensions)
}

/// Bucket key: ordered (dimension, value) pairs
pub type BucketKey = Vec<(String, String)>;

/// Render a bucket key for output, e.g. "gender=female,year=2022"
pub fn format_key(key: &BucketKey) -> String {
    key.iter()
        .map(|(dimension, value)| format!("{}={}", dimension, value))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Default)]
struct Accumulator {
    scored: usize,
    excluded: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn push(&mut self, score: Option<f64>) {
        let Some(score) = score else {
            self.excluded += 1;
            return;
        };
        if self.scored == 0 {
            self.min = score;
            self.max = score;
        } else {
            self.min = self.min.min(score);
            self.max = self.max.max(score);
        }
        self.scored += 1;
        let delta = score - self.mean;
        self.mean += delta / self.scored as f64;
        self.m2 += delta * (score - self.mean);
    }

    fn finish(self) -> AggregateBucket {
        if self.scored == 0 {
            return AggregateBucket {
                scored: 0,
                excluded: self.excluded,
                mean: None,
                variance: None,
                min: None,
                max: None,
            };
        }
        AggregateBucket {
            scored: self.scored,
            excluded: self.excluded,
            mean: Some(self.mean),
            variance: Some(self.m2 / self.scored as f64),
            min: Some(self.min),
            max: Some(self.max),
        }
    }
}

/// Group records by the given dimensions and summarize each bucket
///
/// Every record lands in exactly one bucket, so bucket totals always sum to
/// the record count.
pub fn aggregate(
    records: &[ScoredRecord],
    dimensions: &[Dimension],
) -> BTreeMap<BucketKey, AggregateBucket> {
    let mut ordered: Vec<&ScoredRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.source_id.cmp(&b.source_id).then(a.title.cmp(&b.title)));

    let mut accumulators: BTreeMap<BucketKey, Accumulator> = BTreeMap::new();
    for record in ordered {
        let key: BucketKey = dimensions
            .iter()
            .map(|d| (d.name().to_string(), d.value(record)))
            .collect();
        accumulators
            .entry(key)
            .or_default()
            .push(record.sentiment_score);
    }

    accumulators
        .into_iter()
        .map(|(key, acc)| (key, acc.finish()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookpulse_common::types::Year;
    use bookpulse_common::{BookRecord, Gender, ScoredRecord, Sentiment};

    fn scored(
        title: &str,
        gender: Gender,
        year: Year,
        country: &str,
        sentiment: Sentiment,
    ) -> ScoredRecord {
        let book = BookRecord {
            title: title.to_string(),
            author: "A. Author".to_string(),
            author_gender: gender,
            gender_source: "manual".to_string(),
            year,
            genres: vec!["fiction".to_string()],
            country: country.to_string(),
            language: "en".to_string(),
            source_id: format!("test:{}", title),
            rating: None,
            ratings_count: 0,
        };
        ScoredRecord::new(book, sentiment)
    }

    #[test]
    fn test_parse_dimensions() {
        let dims = parse_dimensions(&["gender".to_string(), "Year".to_string()]).unwrap();
        assert_eq!(dims, vec![Dimension::Gender, Dimension::Year]);

        assert!(parse_dimensions(&["shoe-size".to_string()]).is_err());
        assert!(parse_dimensions(&["year".to_string(), "year".to_string()]).is_err());
    }

    #[test]
    fn test_every_record_in_exactly_one_bucket() {
        let records = vec![
            scored("A", Gender::Female, Year::Known(2020), "France", Sentiment::scored(0.5, "lexicon")),
            scored("B", Gender::Female, Year::Known(2020), "France", Sentiment::scored(-0.5, "lexicon")),
            scored("C", Gender::Male, Year::Known(2021), "Japan", Sentiment::NoSignal),
            scored("D", Gender::Unknown, Year::Unknown, "unknown", Sentiment::scored(0.0, "lexicon")),
        ];
        let dims = parse_dimensions(&["gender".to_string(), "year".to_string()]).unwrap();
        let buckets = aggregate(&records, &dims);

        let total: usize = buckets.values().map(|b| b.total()).sum();
        assert_eq!(total, records.len());
    }

    #[test]
    fn test_welford_statistics() {
        let records = vec![
            scored("A", Gender::Female, Year::Known(2020), "France", Sentiment::scored(0.2, "lexicon")),
            scored("B", Gender::Female, Year::Known(2020), "France", Sentiment::scored(0.6, "lexicon")),
            scored("C", Gender::Female, Year::Known(2020), "France", Sentiment::scored(1.0, "lexicon")),
        ];
        let dims = parse_dimensions(&["gender".to_string()]).unwrap();
        let buckets = aggregate(&records, &dims);

        assert_eq!(buckets.len(), 1);
        let bucket = buckets.values().next().unwrap();
        assert_eq!(bucket.scored, 3);
        assert!((bucket.mean.unwrap() - 0.6).abs() < 1e-9);
        // Population variance of {0.2, 0.6, 1.0}
        assert!((bucket.variance.unwrap() - 0.10666666666666667).abs() < 1e-9);
        assert_eq!(bucket.min, Some(0.2));
        assert_eq!(bucket.max, Some(1.0));
    }

    #[test]
    fn test_no_signal_excluded_from_mean_but_counted() {
        let records = vec![
            scored("A", Gender::Male, Year::Known(2020), "Japan", Sentiment::scored(1.0, "lexicon")),
            scored("B", Gender::Male, Year::Known(2020), "Japan", Sentiment::NoSignal),
        ];
        let dims = parse_dimensions(&["gender".to_string()]).unwrap();
        let buckets = aggregate(&records, &dims);

        let bucket = buckets.values().next().unwrap();
        assert_eq!(bucket.scored, 1);
        assert_eq!(bucket.excluded, 1);
        assert_eq!(bucket.total(), 2);
        assert_eq!(bucket.mean, Some(1.0)); // NoSignal never pulls the mean toward zero
    }

    #[test]
    fn test_all_no_signal_bucket_has_no_stats() {
        let records = vec![scored(
            "A",
            Gender::Unknown,
            Year::Unknown,
            "unknown",
            Sentiment::NoSignal,
        )];
        let dims = parse_dimensions(&["year".to_string()]).unwrap();
        let buckets = aggregate(&records, &dims);

        let bucket = buckets.values().next().unwrap();
        assert_eq!(bucket.scored, 0);
        assert_eq!(bucket.excluded, 1);
        assert_eq!(bucket.mean, None);
        assert_eq!(bucket.variance, None);
    }

    #[test]
    fn test_deterministic_key_order() {
        let records = vec![
            scored("Z", Gender::Male, Year::Known(2021), "Japan", Sentiment::scored(0.1, "lexicon")),
            scored("A", Gender::Female, Year::Known(2020), "France", Sentiment::scored(0.2, "lexicon")),
        ];
        let dims = parse_dimensions(&["year".to_string()]).unwrap();
        let buckets = aggregate(&records, &dims);

        let keys: Vec<String> = buckets.keys().map(format_key).collect();
        assert_eq!(keys, vec!["year=2020", "year=2021"]);
    }
}
