//! CLI parser and command dispatch.

mod fetch;
mod filter;
mod lists;
mod partition;
mod sitemap;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Resilient, resumable HTML page harvesting through rotating proxies")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "PAGEHARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch sitemaps and add every listed URL to the seed list
    Sitemap {
        /// Replace the seed list instead of appending to it
        #[arg(long)]
        truncate: bool,
    },

    /// Keep seed URLs matching the include patterns
    Filter {
        /// Append to the filtered list instead of replacing it
        #[arg(long)]
        append: bool,
    },

    /// Split the filtered list into numbered sub-lists
    Partition {
        /// URLs per sub-list (default: config batch_size)
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Show existing sub-lists with their URL counts
    Lists,

    /// Fetch, validate and store pages for one or more sub-lists
    Fetch {
        /// Sub-list number to fetch
        #[arg(conflicts_with_all = ["all", "file"])]
        sublist: Option<usize>,
        /// Fetch every existing sub-list in order
        #[arg(short, long, conflicts_with = "file")]
        all: bool,
        /// Fetch URLs from an arbitrary list file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Concurrent requests (default: config workers)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Abort the whole run on the first failed URL
        #[arg(long)]
        strict: bool,
        /// Ignore the proxy list and fetch directly
        #[arg(long)]
        direct: bool,
        /// Store every 2xx response without content checks
        #[arg(long)]
        no_validate: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Sitemap { truncate } => sitemap::cmd_sitemap(&config, truncate).await,
        Commands::Filter { append } => filter::cmd_filter(&config, append).await,
        Commands::Partition { batch_size } => {
            partition::cmd_partition(&config, batch_size).await
        }
        Commands::Lists => lists::cmd_lists(&config).await,
        Commands::Fetch {
            sublist,
            all,
            file,
            workers,
            strict,
            direct,
            no_validate,
        } => {
            let target = match (sublist, all, file) {
                (Some(n), _, _) => fetch::FetchTarget::SubList(n),
                (None, true, _) => fetch::FetchTarget::All,
                (None, false, Some(path)) => fetch::FetchTarget::File(path),
                (None, false, None) => {
                    anyhow::bail!("Specify a sub-list number, --all, or --file PATH")
                }
            };
            let overrides = fetch::FetchOverrides {
                workers,
                strict,
                direct,
                no_validate,
            };
            fetch::cmd_fetch(config, target, overrides).await
        }
    }
}
