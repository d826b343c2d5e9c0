//! Terminal progress for fetch runs.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::fetch::FetchEvent;

/// Progress bar over every URL of one list, fed by scheduler events.
#[derive(Clone)]
pub struct FetchProgress {
    bar: ProgressBar,
}

impl FetchProgress {
    pub fn new(total: usize, label: &str) -> anyhow::Result<Self> {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}",
                )?
                .progress_chars("#>-"),
        );
        bar.set_message(label.to_string());
        Ok(Self { bar })
    }

    pub fn handle(&self, event: FetchEvent) {
        match event {
            FetchEvent::SubBatchStarted { number, total, urls } => {
                self.bar
                    .set_message(format!("sub-batch {}/{} ({} URLs)", number, total, urls));
            }
            FetchEvent::UrlFinished { url, label, reason } => {
                self.bar.inc(1);
                self.bar.println(outcome_line(&url, label, reason.as_deref()));
            }
            FetchEvent::SubBatchFinished { number, summary } => {
                self.bar
                    .println(format!("  {} sub-batch {}: {}", style("→").dim(), number, summary));
            }
        }
    }

    /// Drain `rx` on a background task until every sender is dropped.
    pub fn spawn(self, mut rx: mpsc::Receiver<FetchEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                self.handle(event);
            }
            self.bar.finish_and_clear();
        })
    }
}

/// One line per finished URL: saved, already stored, or failed with a reason.
fn outcome_line(url: &str, label: &str, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!("{} [{}] {}: {}", style("✗").red(), label, url, reason),
        None if label == "exists" => format!("{} [{}] {}", style("→").dim(), label, url),
        None => format!("{} [{}] {}", style("✓").green(), label, url),
    }
}
