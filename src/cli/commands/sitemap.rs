//! Sitemap expansion command.

use console::style;

use crate::cli::helpers::{build_fetch_stack, read_required};
use crate::config::Config;
use crate::lists::{write_urls, WriteMode};
use crate::sitemap::expand_sitemaps;

/// Fetch every sitemap in the sitemap list and add its URLs to the seed list.
pub async fn cmd_sitemap(config: &Config, truncate: bool) -> anyhow::Result<()> {
    let sitemap_path = config.sitemap_list_path();
    let sitemaps = read_required(&sitemap_path, "sitemap")?;

    println!(
        "{} Fetching {} sitemaps",
        style("→").cyan(),
        sitemaps.len()
    );

    let stack = build_fetch_stack(config)?;
    let expansion = expand_sitemaps(
        stack.fetcher.as_ref(),
        &stack.proxies,
        &config.retry_policy(),
        &sitemaps,
    )
    .await;

    let mode = if truncate {
        WriteMode::Overwrite
    } else {
        WriteMode::Append
    };
    let seed_path = config.seed_list_path();
    write_urls(&seed_path, &expansion.urls, mode)?;

    println!(
        "{} {} URLs from {} sitemaps saved to {}",
        style("✓").green(),
        expansion.urls.len(),
        expansion.fetched,
        seed_path.display()
    );
    if expansion.failed > 0 {
        println!(
            "  {} {} sitemaps could not be fetched",
            style("!").yellow(),
            expansion.failed
        );
    }

    Ok(())
}
