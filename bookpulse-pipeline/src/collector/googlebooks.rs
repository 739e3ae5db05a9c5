//! Google Books volumes API source
//!
//! Queries `https://www.googleapis.com/books/v1/volumes`. An API key is
//! optional for search but raises quota limits; it is resolved from the
//! environment (never embedded in URLs logged at info level).

use super::openlibrary::urlencode;
use super::{BookSource, SourceError};
use bookpulse_common::RawRecord;
use serde::Deserialize;

const BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const PAGE_SIZE: usize = 40; // API maximum for maxResults

/// Google Books volume-search source
pub struct GoogleBooksSource {
    query: String,
    api_key: Option<String>,
}

impl GoogleBooksSource {
    pub fn new(query: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            query: query.into(),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    /// "2022", "2022-05" or "2022-05-01"
    published_date: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    language: Option<String>,
    average_rating: Option<f64>,
    ratings_count: Option<u64>,
    country: Option<String>,
}

impl BookSource for GoogleBooksSource {
    fn name(&self) -> &str {
        "googlebooks"
    }

    fn page_url(&self, page: usize) -> String {
        let start_index = (page - 1) * PAGE_SIZE;
        let mut url = format!(
            "{}?q={}&startIndex={}&maxResults={}",
            BASE_URL,
            urlencode(&self.query),
            start_index,
            PAGE_SIZE
        );
        if let Some(key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(key);
        }
        url
    }

    fn parse_page(&self, body: &str) -> Result<Vec<RawRecord>, SourceError> {
        let response: VolumesResponse =
            serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

        let records = response
            .items
            .into_iter()
            .map(|volume| {
                let info = volume.volume_info;
                RawRecord {
                    title: info.title,
                    author: info.authors.into_iter().next(),
                    year: info.published_date,
                    genres: info.categories,
                    language: info.language,
                    country: info.country,
                    rating: info.average_rating.map(|r| r.to_string()),
                    ratings_count: info.ratings_count.map(|c| c.to_string()),
                    source: "googlebooks".to_string(),
                    source_ref: volume.id,
                    detail_url: None,
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
    fn test_page_url_start_index() {
        let source = GoogleBooksSource::new("subject:fiction", None);
        assert!(source.page_url(1).contains("startIndex=0"));
        assert!(source.page_url(3).contains("startIndex=80"));
    }

    #[test]
    fn test_api_key_appended() {
        let source = GoogleBooksSource::new("fiction", Some("secret-key".to_string()));
        assert!(source.page_url(1).ends_with("&key=secret-key"));
    }

    #[test]
    fn test_parse_page() {
        let source = GoogleBooksSource::new("fiction", None);
        let body = r#"{
            "items": [
                {
                    "id": "zyTCAlFPjgYC",
                    "volumeInfo": {
                        "title": "The Google Story",
                        "authors": ["David A. Vise", "Mark Malseed"],
                        "publishedDate": "2005-11-15",
                        "categories": ["Business & Economics"],
                        "language": "en",
                        "averageRating": 3.5,
                        "ratingsCount": 136
                    }
                }
            ]
        }"#;

        let records = source.parse_page(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("The Google Story"));
        assert_eq!(records[0].author.as_deref(), Some("David A. Vise"));
        assert_eq!(records[0].year.as_deref(), Some("2005-11-15"));
        assert_eq!(records[0].rating.as_deref(), Some("3.5"));
        assert_eq!(records[0].ratings_count.as_deref(), Some("136"));
        assert_eq!(records[0].source_ref, "zyTCAlFPjgYC");
    }

    #[test]
    fn test_parse_page_without_items_is_empty() {
        let source = GoogleBooksSource::new("fiction", None);
        let records = source.parse_page(r#"{"kind": "books#volumes", "totalItems": 0}"#).unwrap();
        assert!(records.is_empty());
    }
}
