//! Seed list filtering command.

use console::style;

use crate::classifier::UrlClassifier;
use crate::cli::helpers::read_required;
use crate::config::Config;
use crate::lists::{write_urls, WriteMode};

pub async fn cmd_filter(config: &Config, append: bool) -> anyhow::Result<()> {
    let seed_path = config.seed_list_path();
    let urls = read_required(&seed_path, "sitemap")?;

    let classifier = UrlClassifier::new(&config.include_patterns, &config.exclude_patterns)?;
    let kept = classifier.filter(&urls);

    let mode = if append {
        WriteMode::Append
    } else {
        WriteMode::Overwrite
    };
    let filtered_path = config.filtered_list_path();
    write_urls(&filtered_path, &kept, mode)?;

    println!(
        "{} Kept {} of {} URLs, saved to {}",
        style("✓").green(),
        kept.len(),
        urls.len(),
        filtered_path.display()
    );

    Ok(())
}
