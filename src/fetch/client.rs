//! HTTP fetching through optional upstream proxies.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, Proxy};
use tracing::debug;

use super::retry::TransportFailure;
use crate::error::{HarvestError, Result};
use crate::proxy::{ProxyPool, ProxySlot};

/// Fixed browser user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A 2xx response body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Performs a single GET, optionally through a proxy.
///
/// The scheduler only talks to this trait, so tests can substitute a
/// counting double for the network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        proxy: Option<&ProxySlot>,
    ) -> std::result::Result<FetchedPage, TransportFailure>;
}

/// reqwest-backed fetcher with one client per proxy endpoint.
///
/// reqwest binds proxies at client build time, so each endpoint gets its
/// own `Client` (and connection pool), plus one client for direct requests.
#[derive(Clone)]
pub struct HttpFetcher {
    direct: Client,
    proxied: Vec<Client>,
}

impl HttpFetcher {
    pub fn new(pool: &ProxyPool, user_agent: &str, timeout: Duration) -> Result<Self> {
        let direct = build_client(user_agent, timeout, None)?;
        let proxied = pool
            .endpoints()
            .iter()
            .map(|ep| {
                let proxy = Proxy::all(ep.url()).map_err(|e| {
                    HarvestError::Configuration(format!("Invalid proxy '{}': {}", ep, e))
                })?;
                build_client(user_agent, timeout, Some(proxy))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { direct, proxied })
    }

    fn client_for(&self, proxy: Option<&ProxySlot>) -> &Client {
        proxy
            .and_then(|slot| self.proxied.get(slot.index))
            .unwrap_or(&self.direct)
    }
}

fn build_client(user_agent: &str, timeout: Duration, proxy: Option<Proxy>) -> Result<Client> {
    // Ask for gzip explicitly so servers never answer with brotli.
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

    let mut builder = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| HarvestError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        proxy: Option<&ProxySlot>,
    ) -> std::result::Result<FetchedPage, TransportFailure> {
        let client = self.client_for(proxy);

        let start = Instant::now();
        let response = client
            .get(url)
            .send()
            .await
            .map_err(TransportFailure::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportFailure::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(TransportFailure::from)?
            .to_vec();

        debug!(
            "GET {} -> {} ({} bytes in {:?})",
            url,
            status.as_u16(),
            body.len(),
            start.elapsed()
        );

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}
