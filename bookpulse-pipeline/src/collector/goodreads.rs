//! Goodreads yearly popular-list source
//!
//! Goodreads has no public API; this source consumes the JSON shape of its
//! "popular by date" yearly list. Ratings arrive as display text
//! ("4.12", "1.2k ratings") and are cleaned during normalization, not here.

use super::{BookSource, SourceError};
use bookpulse_common::RawRecord;
use serde::Deserialize;

const BASE_URL: &str = "https://www.goodreads.com/book/popular_by_date";

/// Goodreads popular-books-by-year source
pub struct GoodreadsSource {
    year: i32,
}

impl GoodreadsSource {
    pub fn new(year: i32) -> Self {
        Self { year }
    }
}

#[derive(Debug, Deserialize)]
struct PopularListResponse {
    #[serde(default)]
    books: Vec<ListedBook>,
}

#[derive(Debug, Deserialize)]
struct ListedBook {
    id: Option<serde_json::Value>,
    title: Option<String>,
    author: Option<ListedAuthor>,
    /// Display text, e.g. "4.12"
    rating: Option<String>,
    /// Display text, e.g. "1.2k ratings"
    ratings_count: Option<String>,
    url: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListedAuthor {
    name: Option<String>,
}

impl BookSource for GoodreadsSource {
    fn name(&self) -> &str {
        "goodreads"
    }

    fn page_url(&self, page: usize) -> String {
        format!("{}/{}?page={}&format=json", BASE_URL, self.year, page)
    }

    fn parse_page(&self, body: &str) -> Result<Vec<RawRecord>, SourceError> {
        let response: PopularListResponse =
            serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

        let year = self.year;
        let records = response
            .books
            .into_iter()
            .map(|book| {
                // List ids arrive as either numbers or strings
                let source_ref = match &book.id {
                    Some(serde_json::Value::Number(n)) => n.to_string(),
                    Some(serde_json::Value::String(s)) => s.clone(),
                    _ => String::new(),
                };
                RawRecord {
                    title: book.title,
                    author: book.author.and_then(|a| a.name),
                    // The list itself fixes the publication year
                    year: Some(year.to_string()),
                    genres: book.genres,
                    language: None,
                    country: None,
                    rating: book.rating,
                    ratings_count: book.ratings_count,
                    source: "goodreads".to_string(),
                    source_ref,
                    detail_url: book.url,
                }
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url() {
        let source = GoodreadsSource::new(2022);
        assert_eq!(
            source.page_url(2),
            "https://www.goodreads.com/book/popular_by_date/2022?page=2&format=json"
        );
    }

    #[test]
    fn test_parse_page_ratings_kept_raw() {
        let source = GoodreadsSource::new(2022);
        let body = r#"{
            "books": [
                {
                    "id": 61439040,
                    "title": "Tomorrow, and Tomorrow, and Tomorrow",
                    "author": {"name": "Gabrielle Zevin"},
                    "rating": "4.12",
                    "ratings_count": "1.2m ratings",
                    "url": "https://www.goodreads.com/book/show/61439040",
                    "genres": ["Fiction", "Romance"]
                }
            ]
        }"#;

        let records = source.parse_page(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year.as_deref(), Some("2022"));
        assert_eq!(records[0].ratings_count.as_deref(), Some("1.2m ratings"));
        assert_eq!(records[0].source_ref, "61439040");
        assert_eq!(records[0].genres.len(), 2);
    }

    #[test]
    fn test_parse_html_error_page() {
        let source = GoodreadsSource::new(2022);
        assert!(source.parse_page("<!DOCTYPE html><html></html>").is_err());
    }
}
