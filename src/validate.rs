//! Content-level acceptance checks for fetched pages.
//!
//! A 2xx response is not enough: anti-bot challenge pages, truncated captures
//! and redirected pages all come back as 200. Each page must pass three
//! independent gates (compressed size, title deny-list, canonical link) before
//! it is stored. Field extraction is deliberately regex based: first match
//! only, case-insensitive, `.` matching newlines.

use std::borrow::Cow;
use std::io::Write;
use std::sync::LazyLock;

use flate2::write::GzEncoder;
use flate2::Compression;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern should compile")
});

static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link\s+[^>]*rel=["']canonical["'][^>]*href=["']([^"']+)["']"#)
        .expect("canonical pattern should compile")
});

/// Reason a page was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("implausible page size: {compressed} bytes gzipped (allowed {min}..={max})")]
    ImplausibleSize {
        compressed: usize,
        min: usize,
        max: usize,
    },
    #[error("bot challenge page (title {title:?})")]
    BotChallenge { title: String },
    #[error("no canonical link found")]
    MissingCanonical,
    #[error("canonical {canonical} does not match requested {requested}")]
    CanonicalMismatch {
        canonical: String,
        requested: String,
    },
}

/// Validator thresholds and deny-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run the gates at all. Disabled for raw harvesting.
    pub enabled: bool,
    /// Upper bound for the gzip-compressed body size.
    pub max_compressed_bytes: usize,
    /// Optional lower bound for the gzip-compressed body size.
    pub min_compressed_bytes: Option<usize>,
    /// Titles that identify bot-challenge pages.
    pub denied_titles: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_compressed_bytes: 30 * 1024,
            min_compressed_bytes: None,
            denied_titles: vec!["RegisterOpenUser".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseValidator {
    config: ValidationConfig,
}

impl ResponseValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check a fetched body against every gate.
    pub fn validate(&self, requested_url: &str, body: &[u8]) -> Result<(), Rejection> {
        if !self.config.enabled {
            return Ok(());
        }

        self.check_size(body)?;

        let html = decode_lossless(body);

        let title = extract_title(&html).unwrap_or_default();
        debug!("Title for {}: {:?}", requested_url, title);
        if self.config.denied_titles.iter().any(|t| *t == title) {
            return Err(Rejection::BotChallenge { title });
        }

        let canonical = extract_canonical(&html).ok_or(Rejection::MissingCanonical)?;
        debug!("Canonical for {}: {}", requested_url, canonical);
        if trim_trailing_slash(&canonical) != trim_trailing_slash(requested_url) {
            return Err(Rejection::CanonicalMismatch {
                canonical,
                requested: requested_url.to_string(),
            });
        }

        Ok(())
    }

    fn check_size(&self, body: &[u8]) -> Result<(), Rejection> {
        let compressed = compressed_size(body);
        let min = self.config.min_compressed_bytes.unwrap_or(0);
        let max = self.config.max_compressed_bytes;
        debug!("Gzip-compressed size: {} bytes", compressed);

        if compressed > max || compressed < min {
            return Err(Rejection::ImplausibleSize {
                compressed,
                min,
                max,
            });
        }
        Ok(())
    }
}

/// Size of `data` after gzip compression at the default level.
pub fn compressed_size(data: &[u8]) -> usize {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 4), Compression::default());
    // Writes into a Vec are infallible; treat a failure as oversized.
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map(|v| v.len())
        .unwrap_or(usize::MAX)
}

/// Decode as UTF-8, falling back to Latin-1 so decoding never fails.
pub fn decode_lossless(body: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(body) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => Cow::Owned(body.iter().map(|&b| b as char).collect()),
    }
}

/// Text of the first `<title>` element, trimmed.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// `href` of the first `<link rel="canonical">` element, trimmed.
pub fn extract_canonical(html: &str) -> Option<String> {
    CANONICAL_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn trim_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, canonical: Option<&str>) -> Vec<u8> {
        let link = canonical
            .map(|c| format!(r#"<link rel="canonical" href="{}">"#, c))
            .unwrap_or_default();
        format!(
            "<html><head><title>{}</title>{}</head><body>company data</body></html>",
            title, link
        )
        .into_bytes()
    }

    fn validator() -> ResponseValidator {
        ResponseValidator::default()
    }

    #[test]
    fn test_bot_challenge_rejected() {
        let body = page("RegisterOpenUser", Some("https://site/a"));
        assert_eq!(
            validator().validate("https://site/a", &body),
            Err(Rejection::BotChallenge {
                title: "RegisterOpenUser".to_string()
            })
        );
    }

    #[test]
    fn test_trailing_slash_canonical_accepted() {
        let body = page("Horizontplast Kft", Some("https://site/a/"));
        assert_eq!(validator().validate("https://site/a", &body), Ok(()));
    }

    #[test]
    fn test_canonical_mismatch_rejected() {
        let body = page("Horizontplast Kft", Some("https://site/b"));
        assert!(matches!(
            validator().validate("https://site/a", &body),
            Err(Rejection::CanonicalMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_canonical_rejected() {
        let body = page("Horizontplast Kft", None);
        assert_eq!(
            validator().validate("https://site/a", &body),
            Err(Rejection::MissingCanonical)
        );
    }

    #[test]
    fn test_only_one_trailing_slash_stripped() {
        let body = page("Co", Some("https://site/a//"));
        assert!(validator().validate("https://site/a", &body).is_err());
    }

    #[test]
    fn test_oversized_page_rejected() {
        let mut noise = String::with_capacity(200_000);
        let mut x: u32 = 12345;
        for _ in 0..200_000 {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12345);
            noise.push(char::from(b'a' + ((x >> 16) % 26) as u8));
        }
        let body = format!(
            r#"<title>Co</title><link rel="canonical" href="https://site/a">{}"#,
            noise
        );
        assert!(matches!(
            validator().validate("https://site/a", body.as_bytes()),
            Err(Rejection::ImplausibleSize { .. })
        ));
    }

    #[test]
    fn test_min_size_bound() {
        let v = ResponseValidator::new(ValidationConfig {
            min_compressed_bytes: Some(10_000),
            ..Default::default()
        });
        let body = page("Co", Some("https://site/a"));
        assert!(matches!(
            v.validate("https://site/a", &body),
            Err(Rejection::ImplausibleSize { min: 10_000, .. })
        ));
    }

    #[test]
    fn test_disabled_accepts_anything() {
        let v = ResponseValidator::new(ValidationConfig {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(v.validate("https://site/a", b"garbage"), Ok(()));
    }

    #[test]
    fn test_extraction_is_lenient() {
        let html = "<HTML><TITLE lang=\"hu\">\n  Multi\nLine  </TITLE>\
                    <LINK data-x=\"1\" REL='canonical' HREF='https://site/a'>\
                    <title>second</title>";
        assert_eq!(extract_title(html).as_deref(), Some("Multi\nLine"));
        assert_eq!(extract_canonical(html).as_deref(), Some("https://site/a"));
    }

    #[test]
    fn test_latin1_fallback() {
        let body = b"<title>Caf\xe9</title>";
        let html = decode_lossless(body);
        assert_eq!(extract_title(&html).as_deref(), Some("Café"));
    }
}
