//! Page fetching: HTTP client, retry, and the bounded-concurrency scheduler.

mod client;
mod retry;
mod scheduler;
mod types;

pub use client::{FetchedPage, HttpFetcher, PageFetcher, DEFAULT_TIMEOUT, USER_AGENT};
pub use retry::{RetryPolicy, TransportFailure, DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS};
pub use scheduler::{
    FetchScheduler, SchedulerConfig, DEFAULT_SUB_BATCH_PAUSE, DEFAULT_SUB_BATCH_SIZE,
    DEFAULT_WORKERS,
};
pub use types::{FetchAttempt, FetchEvent, FetchOutcome, FetchResult, HarvestSummary, RunMode};
