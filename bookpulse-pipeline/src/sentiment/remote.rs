//! Remote model scorer
//!
//! Delegates scoring to an external multilingual model service over HTTP.
//! Request: POST {"title", "language"}; response: {"score"} in [-1, 1].
//! Transient failures retry with exponential backoff; a record that still
//! fails surfaces a ScoreError so the caller can count it and move on.

use super::{ScoreError, SentimentScorer};
use async_trait::async_trait;
use bookpulse_common::Sentiment;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const INITIAL_BACKOFF_MS: u64 = 500;

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    title: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    score: f64,
}

/// HTTP client for an external sentiment model service
pub struct RemoteScorer {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
}

impl RemoteScorer {
    pub fn new(url: impl Into<String>, max_retries: u32) -> Result<Self, ScoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScoreError::Request(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            max_retries,
        })
    }

    async fn request(&self, title: &str, language: &str) -> Result<f64, ScoreError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ScoreRequest { title, language })
            .send()
            .await
            .map_err(|e| ScoreError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScoreError::Request(format!(
                "status {}",
                response.status()
            )));
        }

        let parsed: ScoreResponse = response
            .json()
            .await
            .map_err(|e| ScoreError::Response(e.to_string()))?;
        Ok(parsed.score)
    }
}

#[async_trait]
impl SentimentScorer for RemoteScorer {
    fn method(&self) -> &'static str {
        "remote-model"
    }

    async fn score_title(&self, title: &str, language: &str) -> Result<Sentiment, ScoreError> {
        if title.trim().is_empty() {
            return Ok(Sentiment::NoSignal);
        }

        let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
        let mut attempt = 0;
        loop {
            match self.request(title, language).await {
                Ok(score) => return Ok(Sentiment::scored(score, self.method())),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max = self.max_retries,
                        error = %e,
                        "Remote scoring attempt failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
