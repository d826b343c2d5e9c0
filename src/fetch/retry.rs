//! Retry policy for transport failures.
//!
//! Transport problems (connection errors, timeouts, non-2xx statuses) are
//! retried against a freshly rotated proxy after a fixed backoff. Content
//! problems are never retried here; they are decided by the validator after
//! a successful fetch.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::client::{FetchedPage, PageFetcher};
use super::types::FetchAttempt;
use crate::error::HarvestError;
use crate::proxy::ProxyPool;

/// Default retry ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default sleep between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Why a single request attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
    #[error("timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("HTTP {0}")]
    Status(u16),
    /// The request could not be built (bad URL, bad proxy). Retrying won't help.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Other(String),
}

impl TransportFailure {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportFailure::InvalidRequest(_))
    }
}

impl From<reqwest::Error> for TransportFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportFailure::Timeout
        } else if e.is_connect() {
            TransportFailure::Connect(e.to_string())
        } else if e.is_builder() {
            TransportFailure::InvalidRequest(e.to_string())
        } else if let Some(status) = e.status() {
            TransportFailure::Status(status.as_u16())
        } else {
            TransportFailure::Other(e.to_string())
        }
    }
}

/// Bounded retry with a fixed backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Whether another attempt should follow `failure` on attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32, failure: &TransportFailure) -> bool {
        failure.is_retryable() && attempt < self.max_attempts
    }

    /// Fetch `url`, rotating to the next proxy on every attempt.
    ///
    /// Falls back to a direct request when the pool is empty.
    pub async fn fetch<F>(
        &self,
        fetcher: &F,
        proxies: &ProxyPool,
        url: &str,
    ) -> Result<FetchedPage, HarvestError>
    where
        F: PageFetcher + ?Sized,
    {
        let mut attempt = 1;
        loop {
            let proxy = proxies.acquire();
            let result = fetcher.fetch(url, proxy.as_ref()).await;

            let record = FetchAttempt {
                url,
                proxy: proxy.as_ref(),
                attempt,
                outcome: result.as_ref().map(|p| p.status),
            };
            debug!("{}", record);

            match result {
                Ok(page) => return Ok(page),
                Err(failure) if self.should_retry(attempt, &failure) => {
                    warn!(
                        "Attempt {}/{} for {} failed ({}), retrying with next proxy",
                        attempt, self.max_attempts, url, failure
                    );
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                }
                Err(failure) => {
                    return Err(HarvestError::Transport {
                        url: url.to_string(),
                        reason: format!("{} after {} attempt(s)", failure, attempt),
                    });
                }
            }
        }
    }
}
