//! pageharvest - resilient, resumable HTML page harvesting.
//!
//! Pipeline: sitemap seeds -> URL classifier -> batch partitioner ->
//! fetch scheduler (proxy pool, retry, validator) -> content store.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod identifier;
pub mod lists;
pub mod partition;
pub mod proxy;
pub mod sitemap;
pub mod storage;
pub mod validate;

pub use classifier::UrlClassifier;
pub use config::Config;
pub use error::{HarvestError, Result};
pub use fetch::{
    FetchOutcome, FetchResult, FetchScheduler, HarvestSummary, HttpFetcher, PageFetcher,
    RetryPolicy, RunMode, SchedulerConfig,
};
pub use identifier::Identifier;
pub use partition::{partition, SubList};
pub use proxy::{ProxyEndpoint, ProxyPool, ProxySlot};
pub use storage::ContentStore;
pub use validate::{Rejection, ResponseValidator, ValidationConfig};
