//! Delimited URL list files.
//!
//! Lists are headerless CSV with the URL in the first field of each row.
//! Seed, filtered and numbered sub-lists all share this format.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{HarvestError, Result};
use crate::partition::SubList;

pub const LIST_EXTENSION: &str = "csv";

/// How [`write_urls`] treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

/// An existing numbered sub-list on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubListFile {
    pub number: usize,
    pub path: PathBuf,
    pub count: usize,
}

/// Read the first field of every non-empty row, trimmed.
pub fn read_urls(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(HarvestError::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(url) = record.get(0).map(str::trim).filter(|u| !u.is_empty()) {
            urls.push(url.to_string());
        }
    }

    debug!("Read {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Write one URL per row.
pub fn write_urls<S: AsRef<str>>(path: &Path, urls: &[S], mode: WriteMode) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(mode == WriteMode::Append)
        .truncate(mode == WriteMode::Overwrite)
        .open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    for url in urls {
        writer.write_record([url.as_ref()])?;
    }
    writer.flush()?;

    debug!("Wrote {} URLs to {} ({:?})", urls.len(), path.display(), mode);
    Ok(())
}

/// `{dir}/{prefix}{number}.csv`
pub fn sublist_path(dir: &Path, prefix: &str, number: usize) -> PathBuf {
    dir.join(format!("{}{}.{}", prefix, number, LIST_EXTENSION))
}

/// Write every sub-list to its numbered file, replacing previous contents.
pub fn write_sublists(dir: &Path, prefix: &str, sublists: &[SubList]) -> Result<Vec<PathBuf>> {
    sublists
        .iter()
        .map(|sub| {
            let path = sublist_path(dir, prefix, sub.number);
            write_urls(&path, sub.urls.as_slice(), WriteMode::Overwrite)?;
            info!("Saved {} URLs to {}", sub.len(), path.display());
            Ok(path)
        })
        .collect()
}

/// Find existing `{prefix}{n}.csv` files in `dir`, sorted by number.
///
/// The unnumbered `{prefix}.csv` seed file never matches.
pub fn discover_sublists(dir: &Path, prefix: &str) -> Result<Vec<SubListFile>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(number) = sublist_number(&path, prefix) else {
            continue;
        };
        let count = read_urls(&path)?.len();
        found.push(SubListFile {
            number,
            path,
            count,
        });
    }

    found.sort_by_key(|f| f.number);
    Ok(found)
}

fn sublist_number(path: &Path, prefix: &str) -> Option<usize> {
    if path.extension().and_then(|e| e.to_str()) != Some(LIST_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|n| *n >= 1)
}
