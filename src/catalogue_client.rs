// Remote contract catalogue reached over HTTP
// Transient failures are retried with exponential backoff and jitter

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::catalogue::{CatalogueError, ContractCatalogue};
use crate::contracts::HotelContractDto;
use crate::model::Contract;

#[derive(Debug, Clone)]
pub struct CatalogueClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub retry_config: RetryConfig,
}

impl Default for CatalogueClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 5000,
            retry_config: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_retried: usize,
}

#[derive(Debug, Default)]
struct ClientCounters {
    requests_sent: AtomicUsize,
    requests_succeeded: AtomicUsize,
    requests_failed: AtomicUsize,
    requests_retried: AtomicUsize,
}

pub struct HttpContractCatalogue {
    client: reqwest::Client,
    config: CatalogueClientConfig,
    counters: ClientCounters,
}

impl HttpContractCatalogue {
    pub fn new(config: CatalogueClientConfig) -> Result<Self, CatalogueError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CatalogueError::Unavailable(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            config,
            counters: ClientCounters::default(),
        })
    }

    pub fn contracts_url(&self) -> String {
        format!("{}/api/v1/contracts", self.config.base_url.trim_end_matches('/'))
    }

    pub fn stats(&self) -> ClientStats {
        ClientStats {
            requests_sent: self.counters.requests_sent.load(Ordering::SeqCst),
            requests_succeeded: self.counters.requests_succeeded.load(Ordering::SeqCst),
            requests_failed: self.counters.requests_failed.load(Ordering::SeqCst),
            requests_retried: self.counters.requests_retried.load(Ordering::SeqCst),
        }
    }

    // Exponential backoff with jitter
    pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
        let base_backoff_ms = (config.initial_backoff_ms as f64
            * config.backoff_multiplier.powf(retry_attempt as f64))
        .min(config.max_backoff_ms as f64);

        let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
        let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

        Duration::from_millis(backoff_ms as u64)
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<HotelContractDto>, CatalogueError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogueError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogueError::UnexpectedStatus {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<Vec<HotelContractDto>>()
            .await
            .map_err(|e| CatalogueError::Decode(e.to_string()))
    }
}

// Connection failures, timeouts and server-side errors
fn is_retryable(error: &CatalogueError) -> bool {
    match error {
        CatalogueError::Unavailable(_) => true,
        CatalogueError::UnexpectedStatus { status_code, .. } => *status_code >= 500,
        CatalogueError::Decode(_) | CatalogueError::ContractNotFound(_) => false,
    }
}

#[async_trait]
impl ContractCatalogue for HttpContractCatalogue {
    async fn list_all_contracts(&self) -> Result<Vec<Contract>, CatalogueError> {
        let url = self.contracts_url();
        let retry_config = &self.config.retry_config;
        let mut attempt = 0;

        let listings = loop {
            self.counters.requests_sent.fetch_add(1, Ordering::SeqCst);

            match self.fetch_once(&url).await {
                Ok(listings) => {
                    self.counters.requests_succeeded.fetch_add(1, Ordering::SeqCst);
                    break listings;
                }
                Err(error) if is_retryable(&error) && attempt < retry_config.max_retries => {
                    let backoff = Self::calculate_backoff(attempt, retry_config);
                    warn!(
                        %url,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        %error,
                        "Catalogue request failed, retrying"
                    );
                    self.counters.requests_retried.fetch_add(1, Ordering::SeqCst);
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(error) => {
                    self.counters.requests_failed.fetch_add(1, Ordering::SeqCst);
                    if is_retryable(&error) {
                        return Err(CatalogueError::Unavailable(format!(
                            "{url} failed after {} attempts: {error}",
                            attempt + 1
                        )));
                    }
                    return Err(error);
                }
            }
        };

        debug!(%url, contracts = listings.len(), "Fetched catalogue");

        listings
            .into_iter()
            .map(|listing| {
                listing
                    .into_contract()
                    .map_err(|e| CatalogueError::Decode(e.to_string()))
            })
            .collect()
    }
}
