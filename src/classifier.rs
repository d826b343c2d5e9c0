//! URL classification by inclusion/exclusion patterns.

use regex::{RegexSet, RegexSetBuilder};

use crate::error::{HarvestError, Result};

/// Filters candidate URLs against case-insensitive pattern sets.
///
/// A URL is kept when it matches at least one inclusion pattern and no
/// exclusion pattern. Exclusion is applied after inclusion, so a URL
/// matching both is dropped. An empty inclusion set keeps every URL.
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    include: RegexSet,
    exclude: RegexSet,
}

impl UrlClassifier {
    pub fn new<I, E, S, T>(include: I, exclude: E) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Ok(Self {
            include: build_set(include)?,
            exclude: build_set(exclude)?,
        })
    }

    /// Check whether a single URL passes the filter.
    pub fn accepts(&self, url: &str) -> bool {
        let included = self.include.is_empty() || self.include.is_match(url);
        included && !self.exclude.is_match(url)
    }

    /// Return the order-preserving subsequence of accepted URLs.
    pub fn filter<S: AsRef<str>>(&self, urls: &[S]) -> Vec<String> {
        urls.iter()
            .map(AsRef::as_ref)
            .filter(|url| self.accepts(url))
            .map(str::to_string)
            .collect()
    }
}

fn build_set<I, S>(patterns: I) -> Result<RegexSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let patterns: Vec<String> = patterns
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect();
    RegexSetBuilder::new(&patterns)
        .case_insensitive(true)
        .build()
        .map_err(|e| HarvestError::Configuration(format!("Invalid URL pattern: {}", e)))
}
