//! On-disk store for validated pages.
//!
//! Pages live under a two-level layout keyed by identifier:
//! `{root}/{SHARD}/{identifier}.html`, where `SHARD` is the first two
//! characters of the identifier uppercased. A page file's existence is the
//! only resume marker; nothing else is tracked.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{HarvestError, Result};
use crate::identifier::Identifier;

/// Extension used for stored pages.
pub const PAGE_EXTENSION: &str = "html";

#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Construct the storage path for an identifier.
    pub fn path_for(&self, identifier: &Identifier) -> PathBuf {
        self.root
            .join(identifier.shard())
            .join(format!("{}.{}", identifier.as_str(), PAGE_EXTENSION))
    }

    /// Check whether a page has already been stored.
    pub fn exists(&self, identifier: &Identifier) -> bool {
        self.path_for(identifier).is_file()
    }

    /// Persist page bytes.
    ///
    /// Content is written to a temporary file in the target directory and
    /// renamed into place, so an interrupted write never leaves a partial
    /// file at the final path.
    pub fn save(&self, identifier: &Identifier, content: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(identifier);
        let dir = path.parent().unwrap_or(&self.root);
        let storage_err = |source| HarvestError::Storage {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(dir).map_err(storage_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(storage_err)?;
        tmp.write_all(content).map_err(storage_err)?;
        tmp.as_file().sync_all().map_err(storage_err)?;
        tmp.persist(&path).map_err(|e| storage_err(e.error))?;

        debug!("Stored {} bytes at {}", content.len(), path.display());
        Ok(path)
    }
}
