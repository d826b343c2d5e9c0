//! Shared helpers for CLI commands.

use std::path::Path;
use std::sync::Arc;

use console::style;

use crate::config::Config;
use crate::fetch::HttpFetcher;
use crate::lists;
use crate::proxy::ProxyPool;

/// Proxy pool and HTTP fetcher built from config.
pub struct FetchStack {
    pub proxies: Arc<ProxyPool>,
    pub fetcher: Arc<HttpFetcher>,
}

/// Load the proxy pool (unless running direct) and build the fetcher.
pub fn build_fetch_stack(config: &Config) -> anyhow::Result<FetchStack> {
    let proxies = if config.direct {
        println!("{} Direct mode: proxies disabled", style("!").yellow());
        ProxyPool::direct()
    } else {
        let pool = ProxyPool::load(&config.proxy_list_path(), config.proxy_rotation_threshold)?;
        if pool.is_empty() {
            println!(
                "{} No proxies loaded, fetching directly",
                style("!").yellow()
            );
        } else {
            println!(
                "{} Loaded {} proxies (rotation reset every {} requests)",
                style("→").cyan(),
                pool.len(),
                pool.rotation_threshold()
            );
        }
        pool
    };

    let fetcher = HttpFetcher::new(&proxies, &config.user_agent, config.request_timeout())?;

    Ok(FetchStack {
        proxies: Arc::new(proxies),
        fetcher: Arc::new(fetcher),
    })
}

/// Read a URL list, printing a hint for the command that produces it when missing.
pub fn read_required(path: &Path, produced_by: &str) -> anyhow::Result<Vec<String>> {
    if !path.is_file() {
        println!(
            "  {} Run 'harvest {}' to create it",
            style("→").dim(),
            produced_by
        );
    }
    Ok(lists::read_urls(path)?)
}
