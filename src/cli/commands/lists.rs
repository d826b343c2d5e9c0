//! Sub-list overview command.

use console::style;

use crate::config::Config;
use crate::lists::{discover_sublists, read_urls};

pub async fn cmd_lists(config: &Config) -> anyhow::Result<()> {
    for (name, path) in [
        ("seed", config.seed_list_path()),
        ("filtered", config.filtered_list_path()),
    ] {
        if path.is_file() {
            println!(
                "{:>10}  {:>8} URLs  {}",
                name,
                read_urls(&path)?.len(),
                path.display()
            );
        }
    }

    let (dir, prefix) = config.sublist_location();
    let found = discover_sublists(&dir, &prefix)?;
    if found.is_empty() {
        println!("{} No sub-lists found", style("!").yellow());
        println!(
            "  {} Run 'harvest partition' to create them",
            style("→").dim()
        );
        return Ok(());
    }

    for sub in &found {
        println!(
            "{:>10}  {:>8} URLs  {}",
            format!("#{}", sub.number),
            sub.count,
            sub.path.display()
        );
    }
    let total: usize = found.iter().map(|s| s.count).sum();
    println!(
        "{} {} sub-lists, {} URLs",
        style("✓").green(),
        found.len(),
        total
    );

    Ok(())
}
