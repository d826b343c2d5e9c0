//! Partition command.

use console::style;

use crate::cli::helpers::read_required;
use crate::config::Config;
use crate::lists::write_sublists;
use crate::partition::partition;

pub async fn cmd_partition(config: &Config, batch_size: Option<usize>) -> anyhow::Result<()> {
    let filtered_path = config.filtered_list_path();
    let urls = read_required(&filtered_path, "filter")?;

    let batch_size = batch_size.unwrap_or(config.batch_size);
    let sublists = partition(&urls, batch_size)?;

    let (dir, prefix) = config.sublist_location();
    let paths = write_sublists(&dir, &prefix, &sublists)?;

    for (sub, path) in sublists.iter().zip(&paths) {
        println!(
            "  {} {} URLs -> {}",
            style("→").dim(),
            sub.len(),
            path.display()
        );
    }
    println!(
        "{} Split {} URLs into {} sub-lists of up to {}",
        style("✓").green(),
        urls.len(),
        sublists.len(),
        batch_size
    );

    Ok(())
}
