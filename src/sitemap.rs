//! Sitemap seed expansion.
//!
//! Each sitemap is fetched through the same fetcher and retry policy as
//! target pages, and every `<loc>` URL it lists becomes a seed URL.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::fetch::{PageFetcher, RetryPolicy};
use crate::proxy::ProxyPool;
use crate::validate::decode_lossless;

static LOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<loc>(https?://[^<]+)</loc>").expect("loc pattern should compile")
});

/// URLs gathered from a set of sitemaps.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SitemapExpansion {
    pub urls: Vec<String>,
    pub fetched: usize,
    pub failed: usize,
}

/// Every `<loc>` URL in `xml`, in document order.
pub fn extract_locs(xml: &str) -> Vec<String> {
    LOC_RE
        .captures_iter(xml)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Fetch each sitemap and collect the URLs it lists.
///
/// A sitemap that cannot be fetched is logged and skipped.
pub async fn expand_sitemaps<F>(
    fetcher: &F,
    proxies: &ProxyPool,
    retry: &RetryPolicy,
    sitemaps: &[String],
) -> SitemapExpansion
where
    F: PageFetcher + ?Sized,
{
    let mut expansion = SitemapExpansion::default();

    for (idx, sitemap) in sitemaps.iter().enumerate() {
        info!("[{}/{}] Fetching sitemap {}", idx + 1, sitemaps.len(), sitemap);
        match retry.fetch(fetcher, proxies, sitemap).await {
            Ok(page) => {
                let locs = extract_locs(&decode_lossless(&page.body));
                info!("Found {} URLs in {}", locs.len(), sitemap);
                expansion.fetched += 1;
                expansion.urls.extend(locs);
            }
            Err(e) => {
                warn!("Skipping sitemap: {}", e);
                expansion.failed += 1;
            }
        }
    }

    expansion
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchedPage, TransportFailure};
    use crate::proxy::ProxySlot;
    use async_trait::async_trait;
    use std::time::Duration;

    #[test]
    fn test_extract_locs() {
        let xml = r#"<?xml version="1.0"?>
<urlset>
  <url><loc>https://www.example.hu/company/a-kft/C1</loc></url>
  <url><LOC>http://www.example.hu/company/b-bt/C2</LOC></url>
  <url><loc>ftp://www.example.hu/skip</loc></url>
</urlset>"#;
        assert_eq!(
            extract_locs(xml),
            vec![
                "https://www.example.hu/company/a-kft/C1",
                "http://www.example.hu/company/b-bt/C2"
            ]
        );
    }

    #[test]
    fn test_extract_locs_empty() {
        assert!(extract_locs("<urlset></urlset>").is_empty());
    }

    struct StaticSitemaps;

    #[async_trait]
    impl PageFetcher for StaticSitemaps {
        async fn fetch(
            &self,
            url: &str,
            _proxy: Option<&ProxySlot>,
        ) -> Result<FetchedPage, TransportFailure> {
            if url.ends_with("broken.xml") {
                return Err(TransportFailure::Status(404));
            }
            Ok(FetchedPage {
                status: 200,
                body: format!("<urlset><url><loc>{}/page</loc></url></urlset>", url).into_bytes(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expand_skips_failed_sitemaps() {
        let sitemaps = vec![
            "https://a.hu/s1.xml".to_string(),
            "https://a.hu/broken.xml".to_string(),
            "https://a.hu/s2.xml".to_string(),
        ];
        let expansion = expand_sitemaps(
            &StaticSitemaps,
            &ProxyPool::direct(),
            &RetryPolicy::new(2, Duration::from_millis(10)),
            &sitemaps,
        )
        .await;

        assert_eq!(expansion.fetched, 2);
        assert_eq!(expansion.failed, 1);
        assert_eq!(
            expansion.urls,
            vec!["https://a.hu/s1.xml/page", "https://a.hu/s2.xml/page"]
        );
    }
}
