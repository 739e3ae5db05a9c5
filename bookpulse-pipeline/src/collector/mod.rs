//! Book metadata collection
//!
//! Fetches raw book records from configured external sources. Each source
//! is paginated; pages are fetched through a shared concurrency-bounded
//! pool with per-source rate limiting and retry-with-backoff. Failures are
//! isolated: a bad page costs that page only, an unreachable source costs
//! that source only, and cancellation returns whatever was already
//! gathered.

pub mod goodreads;
pub mod googlebooks;
pub mod openlibrary;

pub use goodreads::GoodreadsSource;
pub use googlebooks::GoogleBooksSource;
pub use openlibrary::OpenLibrarySource;

use bookpulse_common::config::PipelineConfig;
use bookpulse_common::{RawRecord, RunReport, SourceReport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "bookpulse/0.1 (https://github.com/bookpulse/bookpulse)";
const HTTP_TIMEOUT_SECS: u64 = 30;
const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 8000;
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Errors from a single source interaction
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A paginated external book source
///
/// `page_url` builds the request for a 1-based page number; `parse_page`
/// turns a response body into raw records. An empty page terminates the
/// source's pagination.
pub trait BookSource: Send + Sync {
    /// Source name for provenance and reporting
    fn name(&self) -> &str;

    fn page_url(&self, page: usize) -> String;

    fn parse_page(&self, body: &str) -> Result<Vec<RawRecord>, SourceError>;
}

/// Raw response surface the collector needs from a page fetch
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    /// Seconds from a Retry-After header, when the source sent one
    pub retry_after: Option<u64>,
}

/// Transport abstraction so collection logic is testable without a network
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, SourceError>;
}

/// reqwest-backed fetcher used in production
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(FetchResponse {
            status,
            body,
            retry_after,
        })
    }
}

/// Rate limiter enforcing a minimum interval between requests to one source
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with the rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Collection tuning, derived from the pipeline config
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub page_limit: usize,
    pub max_records_per_source: usize,
    pub concurrency: usize,
    pub rate_limit_ms: u64,
    pub max_retries: u32,
}

impl From<&PipelineConfig> for CollectOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            page_limit: config.page_limit,
            max_records_per_source: config.max_results_per_source,
            concurrency: config.concurrency,
            rate_limit_ms: config.rate_limit_ms,
            max_retries: config.max_retries,
        }
    }
}

/// Collection orchestrator
///
/// Sources run concurrently; every page fetch goes through one shared
/// semaphore so total in-flight requests never exceed the configured
/// concurrency limit.
pub struct Collector {
    fetcher: Arc<dyn PageFetcher>,
    options: CollectOptions,
    cancel: CancellationToken,
    permits: Arc<Semaphore>,
}

impl Collector {
    pub fn new(options: CollectOptions) -> Result<Self, SourceError> {
        let fetcher = Arc::new(HttpFetcher::new()?);
        Ok(Self::with_fetcher(fetcher, options))
    }

    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, options: CollectOptions) -> Self {
        let permits = Arc::new(Semaphore::new(options.concurrency.max(1)));
        Self {
            fetcher,
            options,
            cancel: CancellationToken::new(),
            permits,
        }
    }

    /// Token to cancel the run externally; gathered records are kept
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Collect all configured sources
    ///
    /// Never fails as a whole: per-source and per-page failures land in the
    /// report and collection continues with what remains.
    pub async fn collect(&self, sources: &[Arc<dyn BookSource>]) -> (Vec<RawRecord>, RunReport) {
        let mut join_set = JoinSet::new();

        for source in sources {
            let worker = SourceWorker {
                fetcher: Arc::clone(&self.fetcher),
                options: self.options.clone(),
                cancel: self.cancel.clone(),
                permits: Arc::clone(&self.permits),
                source: Arc::clone(source),
            };
            join_set.spawn(async move { worker.run().await });
        }

        let mut records = Vec::new();
        let mut report = RunReport::default();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((source_records, name, source_report)) => {
                    records.extend(source_records);
                    *report.source_mut(&name) = source_report;
                }
                Err(e) => {
                    warn!("Source task panicked: {}", e);
                }
            }
        }

        report.cancelled = self.cancel.is_cancelled();
        info!(
            records = records.len(),
            sources = sources.len(),
            cancelled = report.cancelled,
            "Collection complete"
        );
        (records, report)
    }
}

/// Per-source collection state, moved into the source's task
struct SourceWorker {
    fetcher: Arc<dyn PageFetcher>,
    options: CollectOptions,
    cancel: CancellationToken,
    permits: Arc<Semaphore>,
    source: Arc<dyn BookSource>,
}

impl SourceWorker {
    async fn run(self) -> (Vec<RawRecord>, String, SourceReport) {
        let name = self.source.name().to_string();
        let limiter = RateLimiter::new(self.options.rate_limit_ms);
        let mut records: Vec<RawRecord> = Vec::new();
        let mut report = SourceReport::default();

        for page in 1..=self.options.page_limit {
            if self.cancel.is_cancelled() {
                debug!(source = %name, "Cancelled, stopping page loop");
                break;
            }
            if records.len() >= self.options.max_records_per_source {
                break;
            }

            let url = self.source.page_url(page);

            let permit = tokio::select! {
                _ = self.cancel.cancelled() => break,
                permit = self.permits.acquire() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };

            let fetched = tokio::select! {
                _ = self.cancel.cancelled() => {
                    drop(permit);
                    break;
                }
                fetched = self.fetch_with_retry(&url, &limiter) => fetched,
            };
            drop(permit);

            match fetched {
                Ok(body) => match self.source.parse_page(&body) {
                    Ok(page_records) => {
                        if page_records.is_empty() {
                            debug!(source = %name, page, "Empty page, pagination ends");
                            break;
                        }
                        report.pages_fetched += 1;
                        let room = self.options.max_records_per_source - records.len();
                        records.extend(page_records.into_iter().take(room));
                    }
                    Err(e) => {
                        report.parse_failures += 1;
                        warn!(source = %name, page, error = %e, "Page parse failure");
                    }
                },
                Err(e) => {
                    if report.pages_fetched == 0 {
                        // Nothing came back yet: treat the source as down
                        report.unavailable = true;
                        warn!(source = %name, error = %e, "Source unavailable after retries");
                        break;
                    }
                    report.fetch_failures += 1;
                    warn!(source = %name, page, error = %e, "Page fetch failed, partial results kept");
                }
            }
        }

        report.records = records.len();
        info!(
            source = %name,
            records = report.records,
            pages = report.pages_fetched,
            "Source collection finished"
        );
        (records, name, report)
    }

    /// Fetch one page with rate limiting and exponential backoff
    ///
    /// Retries network errors, 5xx, and 429 (honoring Retry-After). Other
    /// client errors are not retryable and fail immediately.
    async fn fetch_with_retry(&self, url: &str, limiter: &RateLimiter) -> Result<String, SourceError> {
        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let mut last_error = SourceError::Network("no attempts made".to_string());

        for attempt in 1..=self.options.max_retries.max(1) {
            limiter.wait().await;

            match self.fetcher.fetch(url).await {
                Ok(response) if response.status == 200 => return Ok(response.body),
                Ok(response) if response.status == 429 => {
                    let wait = response.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    warn!(url = %url, attempt, wait_secs = wait, "Rate limited by source");
                    last_error = SourceError::Api(429, "rate limited".to_string());
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                Ok(response) if response.status >= 500 => {
                    warn!(url = %url, attempt, status = response.status, "Server error, will retry");
                    last_error = SourceError::Api(response.status, "server error".to_string());
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                }
                Ok(response) => {
                    // 4xx other than 429: retrying will not help
                    let snippet: String = response.body.chars().take(120).collect();
                    return Err(SourceError::Api(response.status, snippet));
                }
                Err(e) => {
                    debug!(url = %url, attempt, error = %e, "Fetch attempt failed");
                    last_error = e;
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(1000);
        assert_eq!(limiter.min_interval, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(200);

        let start = Instant::now();
        limiter.wait().await;
        let first_elapsed = start.elapsed();

        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(180));
    }

    #[test]
    fn test_options_from_config() {
        let config = PipelineConfig {
            page_limit: 3,
            concurrency: 7,
            ..Default::default()
        };
        let options = CollectOptions::from(&config);
        assert_eq!(options.page_limit, 3);
        assert_eq!(options.concurrency, 7);
    }
}
