//! Core record types for the bookpulse pipeline
//!
//! `RawRecord` is what a source hands back, everything optional. The
//! Normalizer turns it into a canonical `BookRecord`, which is immutable
//! from then on. Scoring derives a `ScoredRecord` without mutating the
//! original, and aggregation produces transient `AggregateBucket` values.
//!
//! All record types serialize flat so they can round-trip through the CSV
//! hand-off format without loss.

use serde::{Deserialize, Serialize};

/// Earliest publication year accepted as plausible (movable type era)
pub const MIN_PLAUSIBLE_YEAR: i32 = 1450;

/// Inferred author gender
///
/// `Unknown` is the default whenever no confident signal exists. Providers
/// must never guess male or female silently; that would bias the
/// downstream aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

/// Publication year, or the explicit "unknown" sentinel
///
/// Unparseable year text never fails a record; it normalizes to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Year {
    Known(i32),
    Unknown,
}

impl Year {
    pub fn known(&self) -> Option<i32> {
        match self {
            Year::Known(y) => Some(*y),
            Year::Unknown => None,
        }
    }
}

impl std::fmt::Display for Year {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Year::Known(y) => write!(f, "{}", y),
            Year::Unknown => write!(f, "unknown"),
        }
    }
}

impl Serialize for Year {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Year {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "unknown" {
            Ok(Year::Unknown)
        } else {
            s.parse::<i32>()
                .map(Year::Known)
                .map_err(|_| serde::de::Error::custom(format!("invalid year: {}", s)))
        }
    }
}

/// Genre list <-> single CSV cell ("fantasy;romance")
mod genre_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(genres: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&genres.join(";"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(s.split(';').map(str::to_string).collect())
        }
    }
}

/// One record as fetched from a source, before any cleaning
///
/// Text fields carry whatever the source sent ("1.2k ratings", "2022-05-01").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Year text in whatever format the source uses
    pub year: Option<String>,
    /// Free-text genre/shelf strings, not yet mapped to the taxonomy
    #[serde(default)]
    pub genres: Vec<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    /// Average rating text, e.g. "4.12"
    pub rating: Option<String>,
    /// Ratings count text, e.g. "1.2k ratings"
    pub ratings_count: Option<String>,
    /// Source name, e.g. "openlibrary"
    pub source: String,
    /// Source-assigned identifier within that source
    pub source_ref: String,
    /// Detail page URL, when the source exposes one
    pub detail_url: Option<String>,
}

/// Canonical book record
///
/// Invariants upheld by the Normalizer:
/// - `title` is non-empty (records failing this are dropped, not passed on)
/// - `(title, source_id)` uniquely identifies the record
/// - `year`, if known, lies in a plausible calendar range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub author_gender: Gender,
    /// Which provider produced the gender value ("manual", "name-api", "none")
    pub gender_source: String,
    pub year: Year,
    /// Canonical genre tags from the taxonomy; never empty after normalization
    #[serde(with = "genre_list")]
    pub genres: Vec<String>,
    /// Canonicalized source country, "unknown" when absent
    pub country: String,
    /// Declared or source-reported language code, "en" default
    pub language: String,
    /// "<source>:<source_ref>", unique together with `title`
    pub source_id: String,
    pub rating: Option<f64>,
    pub ratings_count: u64,
}

impl BookRecord {
    /// Dedup key: (title, source_id) uniquely identify a record
    pub fn key(&self) -> (&str, &str) {
        (&self.title, &self.source_id)
    }

    /// Primary genre tag used for single-valued bucketing
    pub fn primary_genre(&self) -> &str {
        self.genres.first().map(String::as_str).unwrap_or("other")
    }
}

/// Sentiment attached to a scored record
///
/// `NoSignal` is a real sentinel, not a zero score: empty titles and scoring
/// failures must be excluded from aggregate means instead of silently
/// pulling them toward neutral.
#[derive(Debug, Clone, PartialEq)]
pub enum Sentiment {
    Scored { score: f64, method: String },
    NoSignal,
}

impl Sentiment {
    /// Bounded score, clamped to [-1.0, 1.0]
    pub fn scored(score: f64, method: impl Into<String>) -> Self {
        Sentiment::Scored {
            score: score.clamp(-1.0, 1.0),
            method: method.into(),
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Sentiment::Scored { score, .. } => Some(*score),
            Sentiment::NoSignal => None,
        }
    }

    pub fn is_no_signal(&self) -> bool {
        matches!(self, Sentiment::NoSignal)
    }
}

/// A BookRecord with its sentiment attached
///
/// Stored flat so the whole record fits one CSV row. `NoSignal` is encoded
/// as an empty score cell with method "none".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub title: String,
    pub author: String,
    pub author_gender: Gender,
    pub gender_source: String,
    pub year: Year,
    #[serde(with = "genre_list")]
    pub genres: Vec<String>,
    pub country: String,
    pub language: String,
    pub source_id: String,
    pub rating: Option<f64>,
    pub ratings_count: u64,
    /// Empty when the title produced no signal
    pub sentiment_score: Option<f64>,
    /// Scoring method tag; "none" for no-signal records. Two methods are
    /// not directly comparable, so the tag travels with every score.
    pub sentiment_method: String,
}

impl ScoredRecord {
    /// Derive a scored record; the source BookRecord is consumed, not mutated
    pub fn new(book: BookRecord, sentiment: Sentiment) -> Self {
        let (sentiment_score, sentiment_method) = match sentiment {
            Sentiment::Scored { score, method } => (Some(score), method),
            Sentiment::NoSignal => (None, "none".to_string()),
        };
        Self {
            title: book.title,
            author: book.author,
            author_gender: book.author_gender,
            gender_source: book.gender_source,
            year: book.year,
            genres: book.genres,
            country: book.country,
            language: book.language,
            source_id: book.source_id,
            rating: book.rating,
            ratings_count: book.ratings_count,
            sentiment_score,
            sentiment_method,
        }
    }

    pub fn sentiment(&self) -> Sentiment {
        match self.sentiment_score {
            Some(score) => Sentiment::Scored {
                score,
                method: self.sentiment_method.clone(),
            },
            None => Sentiment::NoSignal,
        }
    }

    pub fn primary_genre(&self) -> &str {
        self.genres.first().map(String::as_str).unwrap_or("other")
    }
}

/// Summary statistics for one grouping-dimension combination
///
/// `scored` and `excluded` together account for every record that fell into
/// the bucket, so coverage gaps stay visible. Mean/variance are over scored
/// records only and absent when the bucket holds none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    /// Records with a sentiment score
    pub scored: usize,
    /// No-signal records, counted but excluded from mean/variance
    pub excluded: usize,
    pub mean: Option<f64>,
    /// Population variance over scored records
    pub variance: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateBucket {
    pub fn total(&self) -> usize {
        self.scored + self.excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_display_and_serde() {
        assert_eq!(Year::Known(2022).to_string(), "2022");
        assert_eq!(Year::Unknown.to_string(), "unknown");

        let json = serde_json::to_string(&Year::Known(1998)).unwrap();
        assert_eq!(json, "\"1998\"");
        let back: Year = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Year::Known(1998));

        let back: Year = serde_json::from_str("\"unknown\"").unwrap();
        assert_eq!(back, Year::Unknown);
    }

    #[test]
    fn test_sentiment_clamping() {
        let s = Sentiment::scored(3.5, "lexicon");
        assert_eq!(s.score(), Some(1.0));
        let s = Sentiment::scored(-2.0, "lexicon");
        assert_eq!(s.score(), Some(-1.0));
    }

    #[test]
    fn test_no_signal_encoding() {
        let book = BookRecord {
            title: "The Quiet Sea".to_string(),
            author: "A. Author".to_string(),
            author_gender: Gender::Unknown,
            gender_source: "none".to_string(),
            year: Year::Known(2020),
            genres: vec!["fiction".to_string()],
            country: "unknown".to_string(),
            language: "en".to_string(),
            source_id: "openlibrary:OL1W".to_string(),
            rating: None,
            ratings_count: 0,
        };
        let scored = ScoredRecord::new(book, Sentiment::NoSignal);
        assert_eq!(scored.sentiment_score, None);
        assert_eq!(scored.sentiment_method, "none");
        assert!(scored.sentiment().is_no_signal());
    }

    #[test]
    fn test_scored_record_preserves_fields() {
        let book = BookRecord {
            title: "Bright Morning".to_string(),
            author: "B. Writer".to_string(),
            author_gender: Gender::Female,
            gender_source: "manual".to_string(),
            year: Year::Unknown,
            genres: vec!["romance".to_string(), "fantasy".to_string()],
            country: "France".to_string(),
            language: "fr".to_string(),
            source_id: "googlebooks:abc123".to_string(),
            rating: Some(4.1),
            ratings_count: 1200,
        };
        let scored = ScoredRecord::new(book.clone(), Sentiment::scored(0.5, "lexicon"));
        assert_eq!(scored.title, book.title);
        assert_eq!(scored.genres, book.genres);
        assert_eq!(scored.primary_genre(), "romance");
        assert_eq!(
            scored.sentiment(),
            Sentiment::Scored {
                score: 0.5,
                method: "lexicon".to_string()
            }
        );
    }
}
