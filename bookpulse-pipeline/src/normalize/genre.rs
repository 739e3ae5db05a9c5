//! Genre taxonomy mapping
//!
//! Free-text genre/shelf strings map many-to-one onto a fixed canonical
//! tag set. The table is externally supplied (TOML) so it can evolve
//! without code changes; a built-in table covers common shelf names.
//! Unmapped values become "other".

use bookpulse_common::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Canonical tag for anything the table does not cover
pub const OTHER: &str = "other";

/// Built-in free-text -> canonical tag pairs (keys pre-lowercased)
const DEFAULT_TABLE: &[(&str, &str)] = &[
    ("fiction", "fiction"),
    ("novel", "fiction"),
    ("literary fiction", "fiction"),
    ("contemporary", "fiction"),
    ("classics", "fiction"),
    ("science fiction", "science-fiction"),
    ("sci-fi", "science-fiction"),
    ("scifi", "science-fiction"),
    ("sf", "science-fiction"),
    ("dystopia", "science-fiction"),
    ("fantasy", "fantasy"),
    ("high fantasy", "fantasy"),
    ("urban fantasy", "fantasy"),
    ("magic", "fantasy"),
    ("romance", "romance"),
    ("love stories", "romance"),
    ("love", "romance"),
    ("mystery", "mystery"),
    ("crime", "mystery"),
    ("detective", "mystery"),
    ("detective and mystery stories", "mystery"),
    ("thriller", "thriller"),
    ("suspense", "thriller"),
    ("horror", "horror"),
    ("ghost stories", "horror"),
    ("young adult", "young-adult"),
    ("ya", "young-adult"),
    ("teen", "young-adult"),
    ("children's", "childrens"),
    ("childrens", "childrens"),
    ("juvenile fiction", "childrens"),
    ("picture books", "childrens"),
    ("biography", "biography"),
    ("autobiography", "biography"),
    ("memoir", "biography"),
    ("biography & autobiography", "biography"),
    ("history", "history"),
    ("historical", "history"),
    ("historical fiction", "historical-fiction"),
    ("poetry", "poetry"),
    ("self-help", "self-help"),
    ("self help", "self-help"),
    ("self improvement", "self-help"),
    ("nonfiction", "nonfiction"),
    ("non-fiction", "nonfiction"),
    ("business & economics", "nonfiction"),
    ("science", "nonfiction"),
    ("philosophy", "nonfiction"),
    ("religion", "nonfiction"),
    ("graphic novels", "comics"),
    ("comics", "comics"),
    ("comics & graphic novels", "comics"),
    ("manga", "comics"),
    ("short stories", "short-stories"),
    ("adventure", "adventure"),
    ("humor", "humor"),
    ("comedy", "humor"),
];

/// TOML table shape: `[mapping]` of free text -> canonical tag
#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    #[serde(default)]
    mapping: HashMap<String, String>,
}

/// Many-to-one genre mapping table
pub struct GenreTaxonomy {
    mapping: HashMap<String, String>,
}

impl Default for GenreTaxonomy {
    fn default() -> Self {
        let mapping = DEFAULT_TABLE
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { mapping }
    }
}

impl GenreTaxonomy {
    /// Load a mapping table from TOML; keys are matched case-insensitively
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read taxonomy {} failed: {}", path.display(), e)))?;
        let file: TaxonomyFile = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("parse taxonomy {} failed: {}", path.display(), e)))?;
        let mapping = file
            .mapping
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        Ok(Self { mapping })
    }

    /// Map one free-text genre to its canonical tag, or "other"
    pub fn canonical(&self, free_text: &str) -> String {
        let key = free_text.trim().to_lowercase();
        self.mapping
            .get(&key)
            .cloned()
            .unwrap_or_else(|| OTHER.to_string())
    }

    /// Map a genre list; deduplicates, never returns an empty list
    pub fn map_genres(&self, free_texts: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for text in free_texts {
            if text.trim().is_empty() {
                continue;
            }
            let tag = self.canonical(text);
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
        if out.is_empty() {
            out.push(OTHER.to_string());
        }
        out
    }
}
