//! Fetch outcomes, events and run summaries.

use std::fmt;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use super::retry::TransportFailure;
use crate::error::HarvestError;
use crate::proxy::ProxySlot;
use crate::validate::Rejection;

/// How failures affect the rest of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Record per-URL failures and keep going.
    #[default]
    Batch,
    /// Stop the whole run at the first failure.
    Strict,
}

/// Result of processing one target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page passed validation and was written; holds the stored bytes.
    Saved(Vec<u8>),
    /// A stored page already existed; no request was made.
    AlreadyExists,
    ValidationFailed(Rejection),
    NetworkFailed(String),
    StorageFailed(String),
    InvalidUrl(String),
}

impl FetchOutcome {
    /// Map a per-URL error into the outcome recorded in batch mode.
    pub fn from_error(error: &HarvestError) -> Self {
        match error {
            HarvestError::Validation { rejection, .. } => {
                FetchOutcome::ValidationFailed(rejection.clone())
            }
            HarvestError::Transport { reason, .. } => FetchOutcome::NetworkFailed(reason.clone()),
            HarvestError::InvalidUrl { reason, .. } => FetchOutcome::InvalidUrl(reason.clone()),
            HarvestError::Storage { .. } | HarvestError::Io(_) => {
                FetchOutcome::StorageFailed(error.to_string())
            }
            other => FetchOutcome::NetworkFailed(other.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, FetchOutcome::Saved(_) | FetchOutcome::AlreadyExists)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Saved(_) => "saved",
            FetchOutcome::AlreadyExists => "exists",
            FetchOutcome::ValidationFailed(_) => "invalid",
            FetchOutcome::NetworkFailed(_) => "network",
            FetchOutcome::StorageFailed(_) => "storage",
            FetchOutcome::InvalidUrl(_) => "bad-url",
        }
    }

    /// Failure reason, if any.
    pub fn reason(&self) -> Option<String> {
        match self {
            FetchOutcome::Saved(_) | FetchOutcome::AlreadyExists => None,
            FetchOutcome::ValidationFailed(r) => Some(r.to_string()),
            FetchOutcome::NetworkFailed(r)
            | FetchOutcome::StorageFailed(r)
            | FetchOutcome::InvalidUrl(r) => Some(r.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub outcome: FetchOutcome,
}

/// One request attempt, kept only for retry bookkeeping and logs.
#[derive(Debug)]
pub struct FetchAttempt<'a> {
    pub url: &'a str,
    pub proxy: Option<&'a ProxySlot>,
    pub attempt: u32,
    /// HTTP status on success.
    pub outcome: Result<u16, &'a TransportFailure>,
}

impl fmt::Display for FetchAttempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let via = match self.proxy {
            Some(slot) => slot.endpoint.to_string(),
            None => "direct".to_string(),
        };
        match &self.outcome {
            Ok(status) => write!(
                f,
                "attempt {} for {} via {}: HTTP {}",
                self.attempt, self.url, via, status
            ),
            Err(failure) => write!(
                f,
                "attempt {} for {} via {}: {}",
                self.attempt, self.url, via, failure
            ),
        }
    }
}

/// Aggregate counters for a sub-batch, sub-list or whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub saved: usize,
    pub existed: usize,
    pub errored: usize,
}

impl HarvestSummary {
    pub fn record(&mut self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Saved(_) => self.saved += 1,
            FetchOutcome::AlreadyExists => self.existed += 1,
            _ => self.errored += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.saved + self.existed + self.errored
    }
}

impl AddAssign for HarvestSummary {
    fn add_assign(&mut self, other: Self) {
        self.saved += other.saved;
        self.existed += other.existed;
        self.errored += other.errored;
    }
}

impl fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} saved, {} existed, {} errors",
            self.saved, self.existed, self.errored
        )
    }
}

/// Progress events emitted while a run is in flight.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    SubBatchStarted {
        number: usize,
        total: usize,
        urls: usize,
    },
    UrlFinished {
        url: String,
        label: &'static str,
        reason: Option<String>,
    },
    SubBatchFinished {
        number: usize,
        summary: HarvestSummary,
    },
}
