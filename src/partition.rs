//! Positional partitioning of URL lists into numbered sub-lists.

use crate::error::{HarvestError, Result};

/// A numbered, fixed-size slice of the filtered URL list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubList {
    /// 1-based partition number.
    pub number: usize,
    pub urls: Vec<String>,
}

impl SubList {
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Number of sub-lists produced for `len` URLs at `batch_size`.
pub fn sublist_count(len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    len.div_ceil(batch_size)
}

/// Split `urls` into `ceil(N / B)` consecutive sub-lists numbered from 1.
///
/// Boundaries depend only on position, so the same input and batch size
/// always yield the same partitions.
pub fn partition<S: AsRef<str>>(urls: &[S], batch_size: usize) -> Result<Vec<SubList>> {
    if batch_size == 0 {
        return Err(HarvestError::Configuration(
            "batch size must be at least 1".to_string(),
        ));
    }

    Ok(urls
        .chunks(batch_size)
        .enumerate()
        .map(|(idx, chunk)| SubList {
            number: idx + 1,
            urls: chunk.iter().map(|u| u.as_ref().to_string()).collect(),
        })
        .collect())
}
