//! Record normalization
//!
//! Turns raw source records into canonical `BookRecord`s with deterministic
//! rules: whitespace cleanup, year parsing, genre taxonomy mapping, country
//! canonicalization, ratings-count cleanup, dedup on (title, source_id),
//! and best-effort author gender enrichment through the provider chain.

pub mod country;
pub mod gender;
pub mod genre;
pub mod year;

pub use gender::{GenderProvider, GenderResolver, ManualMapProvider, NameApiProvider};
pub use genre::GenreTaxonomy;

use bookpulse_common::{BookRecord, Error, Gender, RawRecord, Result, RunReport};
use std::collections::HashSet;
use tracing::debug;

/// Trim and collapse internal whitespace
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse ratings-count display text: "1.2k ratings" -> 1200, "3m" -> 3000000
///
/// Unparseable input counts as zero rather than failing the record.
pub fn parse_ratings_count(text: Option<&str>) -> u64 {
    let Some(raw) = text else { return 0 };
    let cleaned = raw.to_lowercase().replace("ratings", "");
    let cleaned = cleaned.trim().replace(',', "");
    if cleaned.is_empty() {
        return 0;
    }

    for (suffix, multiplier) in [("k", 1_000f64), ("m", 1_000_000f64)] {
        if let Some(number) = cleaned.strip_suffix(suffix) {
            if let Ok(value) = number.trim().parse::<f64>() {
                return (value * multiplier) as u64;
            }
        }
    }

    cleaned.parse::<u64>().unwrap_or(0)
}

/// Raw -> canonical record transformation
pub struct Normalizer {
    taxonomy: GenreTaxonomy,
}

impl Normalizer {
    pub fn new(taxonomy: GenreTaxonomy) -> Self {
        Self { taxonomy }
    }

    /// Normalize one raw record
    ///
    /// Fails only on missing mandatory fields (title, source identifier).
    /// Everything else degrades to a sentinel instead of failing.
    pub fn normalize(&self, raw: &RawRecord) -> Result<BookRecord> {
        let title = clean_text(raw.title.as_deref().unwrap_or(""));
        if title.is_empty() {
            return Err(Error::Validation(format!(
                "missing title (source {}:{})",
                raw.source, raw.source_ref
            )));
        }
        if raw.source_ref.trim().is_empty() {
            return Err(Error::Validation(format!(
                "missing source identifier for \"{}\" ({})",
                title, raw.source
            )));
        }

        let author = clean_text(raw.author.as_deref().unwrap_or(""));
        let parsed_year = year::parse_year(raw.year.as_deref().unwrap_or(""));
        let genres = self.taxonomy.map_genres(&raw.genres);
        let country = country::canonical_country(raw.country.as_deref());
        let language = match raw.language.as_deref().map(clean_text) {
            Some(lang) if !lang.is_empty() => lang.to_lowercase(),
            _ => "en".to_string(),
        };
        let rating = raw
            .rating
            .as_deref()
            .and_then(|r| r.trim().parse::<f64>().ok());

        Ok(BookRecord {
            title,
            author,
            author_gender: Gender::Unknown,
            gender_source: "none".to_string(),
            year: parsed_year,
            genres,
            country,
            language,
            source_id: format!("{}:{}", raw.source, raw.source_ref.trim()),
            rating,
            ratings_count: parse_ratings_count(raw.ratings_count.as_deref()),
        })
    }

    /// Normalize a batch: validate, dedup, and enrich author gender
    ///
    /// Drops are counted in the report, never raised.
    pub async fn normalize_all(
        &self,
        raws: &[RawRecord],
        resolver: &GenderResolver,
        report: &mut RunReport,
    ) -> Vec<BookRecord> {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut records = Vec::with_capacity(raws.len());

        for raw in raws {
            let mut record = match self.normalize(raw) {
                Ok(record) => record,
                Err(e) => {
                    debug!(error = %e, "Dropping invalid raw record");
                    report.validation_drops += 1;
                    continue;
                }
            };

            let key = (record.title.clone(), record.source_id.clone());
            if !seen.insert(key) {
                report.duplicates_dropped += 1;
                continue;
            }

            let (gender, source) = resolver.resolve(&record.author).await;
            record.author_gender = gender;
            record.gender_source = source.to_string();

            records.push(record);
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookpulse_common::types::Year;

    fn raw(title: &str, source_ref: &str) -> RawRecord {
        RawRecord {
            title: Some(title.to_string()),
            source: "openlibrary".to_string(),
            source_ref: source_ref.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  The   Quiet \t Sea "), "The Quiet Sea");
    }

    #[test]
    fn test_ratings_count_suffixes() {
        assert_eq!(parse_ratings_count(Some("1.2k ratings")), 1200);
        assert_eq!(parse_ratings_count(Some("3m")), 3_000_000);
        assert_eq!(parse_ratings_count(Some("12,345 ratings")), 12345);
        assert_eq!(parse_ratings_count(Some("oodles")), 0);
        assert_eq!(parse_ratings_count(None), 0);
    }

    #[test]
    fn test_missing_title_is_validation_failure() {
        let normalizer = Normalizer::new(GenreTaxonomy::default());
        let mut record = raw("", "OL1W");
        record.title = Some("   ".to_string());
        assert!(matches!(
            normalizer.normalize(&record),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_year_formats() {
        let normalizer = Normalizer::new(GenreTaxonomy::default());

        let mut record = raw("A Book", "OL1W");
        record.year = Some("2022-05-01".to_string());
        assert_eq!(normalizer.normalize(&record).unwrap().year, Year::Known(2022));

        record.year = Some("unknown-format".to_string());
        let normalized = normalizer.normalize(&record).unwrap();
        assert_eq!(normalized.year, Year::Unknown); // sentinel, not a failure
    }

    #[test]
    fn test_normalize_maps_genres_and_country() {
        let normalizer = Normalizer::new(GenreTaxonomy::default());
        let mut record = raw("Leviathan Wakes", "OL2W");
        record.genres = vec!["Sci-Fi".to_string(), "Space".to_string()];
        record.country = Some("Portland, USA".to_string());
        record.rating = Some("4.25".to_string());

        let normalized = normalizer.normalize(&record).unwrap();
        assert_eq!(normalized.genres, vec!["science-fiction", "other"]);
        assert_eq!(normalized.country, "United States");
        assert_eq!(normalized.rating, Some(4.25));
        assert_eq!(normalized.source_id, "openlibrary:OL2W");
    }

    #[tokio::test]
    async fn test_batch_dedup_and_drop_counting() {
        let normalizer = Normalizer::new(GenreTaxonomy::default());
        let resolver = GenderResolver::disabled();
        let mut report = RunReport::default();

        let raws = vec![
            raw("Same Book", "OL1W"),
            raw("Same Book", "OL1W"), // duplicate
            raw("", "OL2W"),          // invalid
            raw("Other Book", "OL3W"),
        ];

        let records = normalizer.normalize_all(&raws, &resolver, &mut report).await;
        assert_eq!(records.len(), 2);
        assert_eq!(report.duplicates_dropped, 1);
        assert_eq!(report.validation_drops, 1);
        assert!(records.iter().all(|r| !r.title.is_empty()));
    }
}
