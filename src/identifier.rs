//! Stable on-disk identifiers derived from target URLs.

use std::fmt;

use url::Url;

use crate::error::{HarvestError, Result};

/// Deterministic key for a target page.
///
/// Built from the last two path segments of the URL, percent-decoded and
/// joined with `_`, e.g. `/vállalat/horizontplast-kft/MMGJWPVR` becomes
/// `horizontplast-kft_MMGJWPVR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

/// Minimum number of non-empty path segments a target URL must have.
pub const MIN_PATH_DEPTH: usize = 2;

impl Identifier {
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| HarvestError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        if segments.len() < MIN_PATH_DEPTH {
            return Err(HarvestError::InvalidUrl {
                url: url.to_string(),
                reason: format!(
                    "path has {} segment(s), need at least {}",
                    segments.len(),
                    MIN_PATH_DEPTH
                ),
            });
        }

        let tail = &segments[segments.len() - MIN_PATH_DEPTH..];
        let joined = tail
            .iter()
            .map(|seg| decode_segment(seg))
            .collect::<Vec<_>>()
            .join("_");

        Ok(Self(sanitize(&joined)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character uppercase shard directory for this identifier.
    ///
    /// Dots become `_` so the shard is never `.` or `..`.
    pub fn shard(&self) -> String {
        self.0
            .chars()
            .take(2)
            .map(|c| if c == '.' { '_' } else { c })
            .collect::<String>()
            .to_uppercase()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Replace characters that are unsafe in filenames.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}
