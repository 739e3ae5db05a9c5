//! Author gender inference providers
//!
//! Gender is a capability interface so providers can be swapped without
//! touching the Normalizer. Resolution is best-effort and conservative: a
//! provider answers only when confident, and the chain falls through to
//! `Gender::Unknown` — never a silent male/female default.

use async_trait::async_trait;
use bookpulse_common::{Error, Gender, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Minimum probability before a name-lookup answer is accepted
const CONFIDENCE_THRESHOLD: f64 = 0.9;
/// Spacing between name-lookup API requests
const NAME_API_SPACING_MS: u64 = 200;
const NAME_API_BASE_URL: &str = "https://api.genderize.io";

/// A gender inference capability
///
/// `lookup` returns None when the provider has no confident answer for the
/// name; the chain then tries the next provider.
#[async_trait]
pub trait GenderProvider: Send + Sync {
    /// Provider name, recorded as `gender_source` on the book record
    fn name(&self) -> &'static str;

    async fn lookup(&self, full_name: &str) -> Option<Gender>;
}

/// Manual override map loaded from CSV (author,author_gender)
pub struct ManualMapProvider {
    map: HashMap<String, Gender>,
}

#[derive(Debug, Deserialize)]
struct ManualMapRow {
    author: String,
    author_gender: Gender,
}

impl ManualMapProvider {
    pub fn from_csv_file(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| Error::Config(format!("read gender map {} failed: {}", path.display(), e)))?;
        let mut map = HashMap::new();
        for row in reader.deserialize() {
            let row: ManualMapRow =
                row.map_err(|e| Error::Config(format!("bad gender map row: {}", e)))?;
            map.insert(row.author, row.author_gender);
        }
        Ok(Self { map })
    }

    #[cfg(test)]
    pub fn from_entries(entries: &[(&str, Gender)]) -> Self {
        Self {
            map: entries
                .iter()
                .map(|(name, gender)| (name.to_string(), *gender))
                .collect(),
        }
    }
}

#[async_trait]
impl GenderProvider for ManualMapProvider {
    fn name(&self) -> &'static str {
        "manual"
    }

    async fn lookup(&self, full_name: &str) -> Option<Gender> {
        self.map.get(full_name).copied()
    }
}

#[derive(Debug, Deserialize)]
struct NameApiResponse {
    gender: Option<String>,
    #[serde(default)]
    probability: f64,
}

impl NameApiResponse {
    /// Accept the answer only when it names a gender confidently
    fn interpret(&self) -> Option<Gender> {
        if self.probability < CONFIDENCE_THRESHOLD {
            return None;
        }
        match self.gender.as_deref() {
            Some("male") => Some(Gender::Male),
            Some("female") => Some(Gender::Female),
            _ => None,
        }
    }
}

/// First-name lookup against a genderize.io-shaped API
///
/// Caches answers per first name and spaces requests out. Low-probability
/// answers are treated as no answer.
pub struct NameApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cache: Mutex<HashMap<String, Option<Gender>>>,
    last_request: Mutex<Option<Instant>>,
}

impl NameApiProvider {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_base_url(NAME_API_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            cache: Mutex::new(HashMap::new()),
            last_request: Mutex::new(None),
        })
    }

    async fn space_requests(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(last_time) = *last {
            let spacing = Duration::from_millis(NAME_API_SPACING_MS);
            let elapsed = last_time.elapsed();
            if elapsed < spacing {
                tokio::time::sleep(spacing - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn query(&self, first_name: &str) -> Option<Gender> {
        self.space_requests().await;

        let mut url = format!("{}/?name={}", self.base_url, first_name);
        if let Some(key) = &self.api_key {
            url.push_str("&apikey=");
            url.push_str(key);
        }

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(name = %first_name, error = %e, "Name API request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(name = %first_name, status = %response.status(), "Name API error status");
            return None;
        }
        let parsed: NameApiResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(name = %first_name, error = %e, "Name API response unparseable");
                return None;
            }
        };

        let answer = parsed.interpret();
        if answer.is_none() {
            debug!(
                name = %first_name,
                probability = parsed.probability,
                "Name API gave no confident answer"
            );
        }
        answer
    }
}

#[async_trait]
impl GenderProvider for NameApiProvider {
    fn name(&self) -> &'static str {
        "name-api"
    }

    async fn lookup(&self, full_name: &str) -> Option<Gender> {
        let first_name = full_name.split_whitespace().next()?.to_lowercase();
        if first_name.is_empty() {
            return None;
        }

        if let Some(cached) = self.cache.lock().await.get(&first_name) {
            return *cached;
        }

        let answer = self.query(&first_name).await;
        // Cache confident answers only; transient failures may recover
        if answer.is_some() {
            self.cache.lock().await.insert(first_name, answer);
        }
        answer
    }
}

/// Ordered provider chain; first confident answer wins
pub struct GenderResolver {
    providers: Vec<Box<dyn GenderProvider>>,
}

impl GenderResolver {
    pub fn new(providers: Vec<Box<dyn GenderProvider>>) -> Self {
        Self { providers }
    }

    /// Resolver with no providers: every author resolves Unknown
    pub fn disabled() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Resolve a gender and the provider tag that produced it
    pub async fn resolve(&self, full_name: &str) -> (Gender, &'static str) {
        if full_name.trim().is_empty() {
            return (Gender::Unknown, "none");
        }
        for provider in &self.providers {
            if let Some(gender) = provider.lookup(full_name).await {
                return (gender, provider.name());
            }
        }
        (Gender::Unknown, "none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_map_hit() {
        let provider = ManualMapProvider::from_entries(&[("J.K. Rowling", Gender::Female)]);
        assert_eq!(provider.lookup("J.K. Rowling").await, Some(Gender::Female));
        assert_eq!(provider.lookup("Unknown Person").await, None);
    }

    #[tokio::test]
    async fn test_chain_priority_and_fallthrough() {
        let manual = ManualMapProvider::from_entries(&[("Ann Leckie", Gender::Female)]);
        let resolver = GenderResolver::new(vec![Box::new(manual)]);

        let (gender, source) = resolver.resolve("Ann Leckie").await;
        assert_eq!(gender, Gender::Female);
        assert_eq!(source, "manual");

        let (gender, source) = resolver.resolve("Nobody Inparticular").await;
        assert_eq!(gender, Gender::Unknown);
        assert_eq!(source, "none");
    }

    #[test]
    fn test_low_probability_answer_rejected() {
        let confident = NameApiResponse {
            gender: Some("female".to_string()),
            probability: 0.97,
        };
        assert_eq!(confident.interpret(), Some(Gender::Female));

        let hesitant = NameApiResponse {
            gender: Some("female".to_string()),
            probability: 0.89,
        };
        assert_eq!(hesitant.interpret(), None);

        let boundary = NameApiResponse {
            gender: Some("male".to_string()),
            probability: 0.9,
        };
        assert_eq!(boundary.interpret(), Some(Gender::Male));
    }

    #[test]
    fn test_null_or_unexpected_gender_rejected() {
        let null_gender = NameApiResponse {
            gender: None,
            probability: 1.0,
        };
        assert_eq!(null_gender.interpret(), None);

        let odd_value = NameApiResponse {
            gender: Some("unclear".to_string()),
            probability: 1.0,
        };
        assert_eq!(odd_value.interpret(), None);
    }

    #[tokio::test]
    async fn test_empty_name_is_unknown() {
        let resolver = GenderResolver::disabled();
        let (gender, source) = resolver.resolve("   ").await;
        assert_eq!(gender, Gender::Unknown);
        assert_eq!(source, "none");
    }
}
