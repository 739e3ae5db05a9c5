//! Configuration loading and resolution
//!
//! TOML file + environment + CLI flags, resolved in priority order:
//! CLI argument > environment variable > TOML file > compiled default.
//! API keys are resolved separately so they never have to live in the
//! config file.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "BOOKPULSE_CONFIG";
/// Environment variable carrying the Google Books API key
pub const GOOGLE_BOOKS_KEY_ENV: &str = "BOOKPULSE_GOOGLE_BOOKS_API_KEY";
/// Environment variable carrying the name-lookup (genderize) API key
pub const GENDERIZE_KEY_ENV: &str = "BOOKPULSE_GENDERIZE_API_KEY";

/// Which sentiment method scores titles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentMethod {
    /// Embedded lexicon; fast, deterministic, no network
    Lexicon,
    /// Delegate to an external multilingual model service
    Remote,
}

impl Default for SentimentMethod {
    fn default() -> Self {
        SentimentMethod::Lexicon
    }
}

/// Supported external sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    OpenLibrary,
    GoogleBooks,
    Goodreads,
}

/// One configured source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Search query for API-backed sources (subject, keyword)
    #[serde(default)]
    pub query: Option<String>,
}

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Inclusive publication-year filter, applied after normalization
    #[serde(default)]
    pub year_from: Option<i32>,
    #[serde(default)]
    pub year_to: Option<i32>,

    /// Cap on raw records per source
    #[serde(default = "default_max_results")]
    pub max_results_per_source: usize,
    /// Cap on pages fetched per source
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    /// Concurrent fetch permits across all sources
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Minimum delay between requests to one source
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    /// Retry attempts per page before surfacing a fetch failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Global run timeout; on expiry the run returns partial results
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,

    /// Grouping dimensions for the aggregate output
    #[serde(default = "default_group_by")]
    pub group_by: Vec<String>,

    #[serde(default)]
    pub sentiment_method: SentimentMethod,
    /// Endpoint for the remote model service (required when method = remote)
    #[serde(default)]
    pub remote_scorer_url: Option<String>,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Aggregate buckets CSV; derived from output_path when unset
    #[serde(default)]
    pub buckets_path: Option<PathBuf>,

    /// Genre taxonomy table (TOML); built-in table used when unset
    #[serde(default)]
    pub taxonomy_path: Option<PathBuf>,
    /// Manual author -> gender override map (CSV)
    #[serde(default)]
    pub gender_map_path: Option<PathBuf>,
    /// Query the name-lookup API for authors the manual map misses
    #[serde(default)]
    pub enable_gender_api: bool,

    /// Google Books API key; the environment variable takes priority
    #[serde(default)]
    pub google_books_api_key: Option<String>,
}

fn default_max_results() -> usize {
    200
}
fn default_page_limit() -> usize {
    10
}
fn default_concurrency() -> usize {
    4
}
fn default_rate_limit_ms() -> u64 {
    1000
}
fn default_max_retries() -> u32 {
    3
}
fn default_output_path() -> PathBuf {
    PathBuf::from("data/processed/scored_books.csv")
}
fn default_group_by() -> Vec<String> {
    vec!["gender".to_string(), "year".to_string()]
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            year_from: None,
            year_to: None,
            max_results_per_source: default_max_results(),
            page_limit: default_page_limit(),
            concurrency: default_concurrency(),
            rate_limit_ms: default_rate_limit_ms(),
            max_retries: default_max_retries(),
            run_timeout_secs: None,
            group_by: default_group_by(),
            sentiment_method: SentimentMethod::default(),
            remote_scorer_url: None,
            output_path: default_output_path(),
            buckets_path: None,
            taxonomy_path: None,
            gender_map_path: None,
            enable_gender_api: false,
            google_books_api_key: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {} failed: {}", path.display(), e)))?;
        let config: PipelineConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("parse {} failed: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve config file path: explicit argument > env > ./bookpulse.toml
    ///
    /// Returns None when no config file exists anywhere; defaults apply.
    pub fn resolve_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from("bookpulse.toml");
        if local.exists() {
            return Some(local);
        }
        None
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.page_limit == 0 {
            return Err(Error::Config("page_limit must be at least 1".to_string()));
        }
        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                return Err(Error::Config(format!(
                    "year_from {} is after year_to {}",
                    from, to
                )));
            }
        }
        if self.group_by.is_empty() {
            return Err(Error::Config(
                "group_by must name at least one dimension".to_string(),
            ));
        }
        if self.sentiment_method == SentimentMethod::Remote && self.remote_scorer_url.is_none() {
            return Err(Error::Config(
                "sentiment_method = \"remote\" requires remote_scorer_url".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the Google Books API key: env > TOML
    pub fn resolve_google_books_api_key(&self) -> Option<String> {
        let env_key = std::env::var(GOOGLE_BOOKS_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty());
        let toml_key = self
            .google_books_api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty());

        if env_key.is_some() && toml_key.is_some() {
            warn!(
                "Google Books API key found in both {} and TOML config; using environment",
                GOOGLE_BOOKS_KEY_ENV
            );
        }
        env_key.or_else(|| toml_key.cloned())
    }

    /// Buckets output path, next to the records output by default
    pub fn resolved_buckets_path(&self) -> PathBuf {
        self.buckets_path
            .clone()
            .unwrap_or_else(|| self.output_path.with_file_name("buckets.csv"))
    }
}
