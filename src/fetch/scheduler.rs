//! Bounded-concurrency fetch scheduler.
//!
//! URLs are processed in sequential sub-batches. Within a sub-batch every URL
//! runs concurrently, but at most `workers` of them hold a network slot at
//! once. Sub-batch N+1 starts only after every URL in sub-batch N finished,
//! followed by a fixed pause to throttle the aggregate request rate.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

use super::client::PageFetcher;
use super::retry::RetryPolicy;
use super::types::{FetchEvent, FetchOutcome, FetchResult, HarvestSummary, RunMode};
use crate::error::{HarvestError, Result};
use crate::identifier::Identifier;
use crate::proxy::ProxyPool;
use crate::storage::ContentStore;
use crate::validate::ResponseValidator;

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_SUB_BATCH_SIZE: usize = 500;
pub const DEFAULT_SUB_BATCH_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum requests in flight.
    pub workers: usize,
    pub sub_batch_size: usize,
    /// Pause between sub-batches.
    pub sub_batch_pause: Duration,
    pub retry: RetryPolicy,
    pub mode: RunMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            sub_batch_size: DEFAULT_SUB_BATCH_SIZE,
            sub_batch_pause: DEFAULT_SUB_BATCH_PAUSE,
            retry: RetryPolicy::default(),
            mode: RunMode::Batch,
        }
    }
}

/// Drives fetch, validation and storage for a list of target URLs.
///
/// Owns no persistent state: rotation lives in the [`ProxyPool`], stored
/// pages in the [`ContentStore`].
pub struct FetchScheduler<F: PageFetcher + ?Sized> {
    fetcher: Arc<F>,
    proxies: Arc<ProxyPool>,
    store: ContentStore,
    validator: ResponseValidator,
    config: SchedulerConfig,
    slots: Semaphore,
    events: Option<mpsc::Sender<FetchEvent>>,
}

impl<F: PageFetcher + ?Sized> FetchScheduler<F> {
    pub fn new(
        fetcher: Arc<F>,
        proxies: Arc<ProxyPool>,
        store: ContentStore,
        validator: ResponseValidator,
        config: SchedulerConfig,
    ) -> Self {
        let config = SchedulerConfig {
            workers: config.workers.max(1),
            sub_batch_size: config.sub_batch_size.max(1),
            ..config
        };
        Self {
            fetcher,
            proxies,
            store,
            validator,
            slots: Semaphore::new(config.workers),
            config,
            events: None,
        }
    }

    /// Send progress events to `tx` while running.
    pub fn with_events(mut self, tx: mpsc::Sender<FetchEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Process every URL, sub-batch by sub-batch, and return the totals.
    ///
    /// In strict mode the first failing URL aborts the run with its error.
    pub async fn run(&self, urls: &[String]) -> Result<HarvestSummary> {
        let sub_batches: Vec<&[String]> = urls.chunks(self.config.sub_batch_size).collect();
        let total = sub_batches.len();
        let mut summary = HarvestSummary::default();

        for (idx, batch) in sub_batches.into_iter().enumerate() {
            let number = idx + 1;
            info!("Processing sub-batch {}/{} with {} URLs", number, total, batch.len());
            self.emit(FetchEvent::SubBatchStarted {
                number,
                total,
                urls: batch.len(),
            })
            .await;

            let mut batch_summary = HarvestSummary::default();
            for result in self.fetch_sub_batch(batch).await? {
                batch_summary.record(&result.outcome);
            }

            info!("Sub-batch {}: {}", number, batch_summary);
            self.emit(FetchEvent::SubBatchFinished {
                number,
                summary: batch_summary,
            })
            .await;
            summary += batch_summary;

            if number < total {
                tokio::time::sleep(self.config.sub_batch_pause).await;
            }
        }

        Ok(summary)
    }

    /// Process one sub-batch concurrently. Results arrive in completion order.
    pub async fn fetch_sub_batch(&self, urls: &[String]) -> Result<Vec<FetchResult>> {
        let mut pending: FuturesUnordered<_> = urls
            .iter()
            .map(|url| async move { (url, self.process(url).await) })
            .collect();

        let mut results = Vec::with_capacity(urls.len());
        while let Some((url, result)) = pending.next().await {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) if e.is_configuration() || self.config.mode == RunMode::Strict => {
                    // Dropping `pending` cancels the remaining fetches.
                    error!("Aborting run at {}: {}", url, e);
                    return Err(e);
                }
                Err(e) => FetchOutcome::from_error(&e),
            };

            log_outcome(url, &outcome);
            self.emit(FetchEvent::UrlFinished {
                url: url.clone(),
                label: outcome.label(),
                reason: outcome.reason(),
            })
            .await;

            results.push(FetchResult {
                url: url.clone(),
                outcome,
            });
        }

        Ok(results)
    }

    /// Resolve a single URL: resume check, fetch with retry, validate, store.
    async fn process(&self, url: &str) -> Result<FetchOutcome> {
        let identifier = Identifier::from_url(url)?;
        if self.store.exists(&identifier) {
            return Ok(FetchOutcome::AlreadyExists);
        }

        let page = {
            let _slot = self.slots.acquire().await.map_err(|_| {
                HarvestError::Configuration("fetch slots closed".to_string())
            })?;
            self.config
                .retry
                .fetch(self.fetcher.as_ref(), &self.proxies, url)
                .await?
        };

        self.validator
            .validate(url, &page.body)
            .map_err(|rejection| HarvestError::Validation {
                url: url.to_string(),
                rejection,
            })?;

        self.store.save(&identifier, &page.body)?;
        Ok(FetchOutcome::Saved(page.body))
    }

    async fn emit(&self, event: FetchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }
}

fn log_outcome(url: &str, outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Saved(body) => info!("Saved {} ({} bytes)", url, body.len()),
        FetchOutcome::AlreadyExists => info!("Already exists, skipping fetch: {}", url),
        failed => warn!(
            "Failed {} [{}]: {}",
            url,
            failed.label(),
            failed.reason().unwrap_or_default()
        ),
    }
}
