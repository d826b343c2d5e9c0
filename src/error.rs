//! Error types for the harvesting pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::validate::Rejection;

pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required input file does not exist.
    #[error("Required input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Transport failure that survived every retry.
    #[error("Fetch failed for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The page was fetched but rejected by the validator.
    #[error("Validation failed for {url}: {rejection}")]
    Validation { url: String, rejection: Rejection },

    /// Writing a stored page failed.
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// URL cannot be mapped to an identifier.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HarvestError {
    /// Fatal errors stop the run regardless of run mode.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HarvestError::Configuration(_) | HarvestError::MissingInput(_)
        )
    }
}
