//! Fetch command: harvest pages for one or more URL lists.

use std::path::PathBuf;

use console::style;
use tokio::sync::mpsc;

use crate::cli::helpers::{build_fetch_stack, read_required};
use crate::cli::progress::FetchProgress;
use crate::config::Config;
use crate::fetch::{FetchEvent, FetchScheduler, HarvestSummary, RunMode};
use crate::lists::{discover_sublists, sublist_path};
use crate::storage::ContentStore;
use crate::validate::ResponseValidator;

/// Which URL lists to fetch.
pub enum FetchTarget {
    SubList(usize),
    All,
    File(PathBuf),
}

/// Per-invocation overrides of config values.
pub struct FetchOverrides {
    pub workers: Option<usize>,
    pub strict: bool,
    pub direct: bool,
    pub no_validate: bool,
}

impl FetchOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.strict {
            config.mode = RunMode::Strict;
        }
        if self.direct {
            config.direct = true;
        }
        if self.no_validate {
            config.validation.enabled = false;
        }
    }
}

/// Resolve the list files to fetch.
///
/// Sub-lists live next to the config; a `--file` path is used as given,
/// relative to the working directory.
fn list_paths(config: &Config, target: FetchTarget) -> anyhow::Result<Vec<PathBuf>> {
    let (dir, prefix) = config.sublist_location();
    match target {
        FetchTarget::SubList(n) => Ok(vec![sublist_path(&dir, &prefix, n)]),
        FetchTarget::File(path) => Ok(vec![path]),
        FetchTarget::All => {
            let found = discover_sublists(&dir, &prefix)?;
            if found.is_empty() {
                anyhow::bail!(
                    "No sub-lists found in {}; run 'harvest partition' first",
                    dir.display()
                );
            }
            Ok(found.into_iter().map(|s| s.path).collect())
        }
    }
}

pub async fn cmd_fetch(
    mut config: Config,
    target: FetchTarget,
    overrides: FetchOverrides,
) -> anyhow::Result<()> {
    overrides.apply(&mut config);
    config.validate()?;

    // Read every input list before any network work.
    let paths = list_paths(&config, target)?;
    let inputs = paths
        .into_iter()
        .map(|path| read_required(&path, "partition").map(|urls| (path, urls)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if !config.validation.enabled {
        println!(
            "{} Validation disabled: every 2xx response will be stored",
            style("!").yellow()
        );
    }

    let stack = build_fetch_stack(&config)?;
    let store = ContentStore::new(config.data_dir_path());
    let validator = ResponseValidator::new(config.validation.clone());

    println!(
        "{} Fetching with {} workers ({} mode) into {}",
        style("→").cyan(),
        config.workers,
        match config.mode {
            RunMode::Batch => "batch",
            RunMode::Strict => "strict",
        },
        store.root().display()
    );

    let mut total = HarvestSummary::default();
    for (path, urls) in inputs {
        println!(
            "{} {} ({} URLs)",
            style("→").cyan(),
            path.display(),
            urls.len()
        );

        let (event_tx, event_rx) = mpsc::channel::<FetchEvent>(100);
        let progress = FetchProgress::new(urls.len(), &path.display().to_string())?;
        let event_handler = progress.spawn(event_rx);

        let scheduler = FetchScheduler::new(
            stack.fetcher.clone(),
            stack.proxies.clone(),
            store.clone(),
            validator.clone(),
            config.scheduler_config(),
        )
        .with_events(event_tx);

        let result = scheduler.run(&urls).await;
        drop(scheduler);
        if let Err(e) = event_handler.await {
            tracing::warn!("Event handler task failed: {}", e);
        }

        let summary = result?;
        println!("{} {}", style("✓").green(), summary);
        total += summary;
    }

    println!("{} Done: {}", style("✓").green(), total);
    if total.errored > 0 {
        println!(
            "  {} Re-run the same command to retry failed URLs",
            style("→").dim()
        );
    }

    Ok(())
}
