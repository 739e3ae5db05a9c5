//! OpenLibrary search API source
//!
//! Queries `https://openlibrary.org/search.json` with a subject/keyword
//! query. Responses carry work-level metadata: title, authors, first
//! publication year, subject shelves, languages.

use super::{BookSource, SourceError};
use bookpulse_common::RawRecord;
use serde::Deserialize;

const BASE_URL: &str = "https://openlibrary.org/search.json";
const PAGE_SIZE: usize = 100;

/// OpenLibrary work-search source
pub struct OpenLibrarySource {
    query: String,
}

impl OpenLibrarySource {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    title: Option<String>,
    /// Work key, e.g. "/works/OL45883W"
    key: Option<String>,
    author_name: Option<Vec<String>>,
    first_publish_year: Option<i32>,
    subject: Option<Vec<String>>,
    language: Option<Vec<String>>,
}

impl BookSource for OpenLibrarySource {
    fn name(&self) -> &str {
        "openlibrary"
    }

    fn page_url(&self, page: usize) -> String {
        format!(
            "{}?q={}&page={}&limit={}&fields=title,key,author_name,first_publish_year,subject,language",
            BASE_URL,
            urlencode(&self.query),
            page,
            PAGE_SIZE
        )
    }

    fn parse_page(&self, body: &str) -> Result<Vec<RawRecord>, SourceError> {
        let response: SearchResponse =
            serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

        let records = response
            .docs
            .into_iter()
            .map(|doc| {
                let source_ref = doc
                    .key
                    .as_deref()
                    .map(|k| k.trim_start_matches("/works/").to_string())
                    .unwrap_or_default();
                RawRecord {
                    title: doc.title,
                    author: doc.author_name.and_then(|names| names.into_iter().next()),
                    year: doc.first_publish_year.map(|y| y.to_string()),
                    genres: doc.subject.unwrap_or_default(),
                    language: doc.language.and_then(|langs| langs.into_iter().next()),
                    country: None,
                    rating: None,
                    ratings_count: None,
                    source: "openlibrary".to_string(),
                    source_ref,
                    detail_url: None,
                }
            })
            .collect();

        Ok(records)
    }
}

/// Minimal percent-encoding for query strings
pub(crate) fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(c),
            ' ' => out.push('+'),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).as_bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    out
}
