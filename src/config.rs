//! Configuration for pageharvest.
//!
//! Loaded from `pageharvest.toml` / `pageharvest.json` (or an explicit
//! `--config` path). Every key is optional and falls back to the defaults
//! below; CLI flags are applied on top by the command layer.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HarvestError, Result};
use crate::fetch::{RetryPolicy, RunMode, SchedulerConfig, USER_AGENT};
use crate::proxy::DEFAULT_ROTATION_THRESHOLD;
use crate::validate::ValidationConfig;

/// File names searched in the working directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["pageharvest.toml", "pageharvest.json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed URL list (sitemap expansion output, classifier input).
    pub seed_list: String,
    pub sitemap_list: String,
    /// Classifier output.
    pub filtered_list: String,
    /// Sub-lists are written as `{sublist_prefix}{n}.csv`.
    pub sublist_prefix: String,
    pub proxy_list: String,
    /// Content Store root.
    pub data_dir: String,

    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,

    pub batch_size: usize,
    pub workers: usize,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    pub sub_batch_size: usize,
    pub sub_batch_pause_ms: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub proxy_rotation_threshold: usize,
    pub user_agent: String,

    pub validation: ValidationConfig,
    pub mode: RunMode,
    /// Ignore the proxy list and fetch directly.
    pub direct: bool,

    /// File this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_list: "URL_LIST.csv".to_string(),
            sitemap_list: "SITEMAP_LIST.csv".to_string(),
            filtered_list: "FILTERED_URL_LIST.csv".to_string(),
            sublist_prefix: "URL_LIST".to_string(),
            proxy_list: "PROXI_LIST.csv".to_string(),
            data_dir: "Companies".to_string(),
            include_patterns: vec!["-kft".to_string(), "-bt".to_string(), "-zrt".to_string()],
            exclude_patterns: Vec::new(),
            batch_size: 10_000,
            workers: 10,
            request_timeout: 30,
            sub_batch_size: 500,
            sub_batch_pause_ms: 1000,
            max_attempts: 5,
            retry_backoff_ms: 1000,
            proxy_rotation_threshold: DEFAULT_ROTATION_THRESHOLD,
            user_agent: USER_AGENT.to_string(),
            validation: ValidationConfig::default(),
            mode: RunMode::Batch,
            direct: false,
            source_path: None,
        }
    }
}

impl Config {
    /// Load from `explicit` if given, otherwise from the first config file
    /// found in the working directory, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => {
                let cwd = std::env::current_dir()?;
                Self::discover_in(&cwd)
            }
        }
    }

    /// Load the first known config file in `dir`, or defaults if none exists.
    pub fn discover_in(dir: &Path) -> Result<Self> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Self::load_from_path(&candidate);
            }
        }
        debug!("No config file in {}, using defaults", dir.display());
        Ok(Self::default())
    }

    /// Parse a TOML or JSON config file, chosen by extension.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            HarvestError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let mut config: Config = match ext {
            "json" => serde_json::from_str(&contents).map_err(|e| {
                HarvestError::Configuration(format!("Failed to parse JSON config: {}", e))
            })?,
            _ => toml::from_str(&contents).map_err(|e| {
                HarvestError::Configuration(format!("Failed to parse TOML config: {}", e))
            })?,
        };

        config.source_path = Some(path.to_path_buf());
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("batch_size", self.batch_size),
            ("workers", self.workers),
            ("sub_batch_size", self.sub_batch_size),
        ] {
            if value == 0 {
                return Err(HarvestError::Configuration(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        if self.max_attempts == 0 {
            return Err(HarvestError::Configuration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory relative paths resolve against: the config file's directory,
    /// or the working directory.
    pub fn base_dir(&self) -> PathBuf {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Expand `~` and resolve `path_str` against [`Config::base_dir`].
    pub fn resolve_path(&self, path_str: &str) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir().join(path)
        }
    }

    pub fn seed_list_path(&self) -> PathBuf {
        self.resolve_path(&self.seed_list)
    }

    pub fn sitemap_list_path(&self) -> PathBuf {
        self.resolve_path(&self.sitemap_list)
    }

    pub fn filtered_list_path(&self) -> PathBuf {
        self.resolve_path(&self.filtered_list)
    }

    pub fn proxy_list_path(&self) -> PathBuf {
        self.resolve_path(&self.proxy_list)
    }

    pub fn data_dir_path(&self) -> PathBuf {
        self.resolve_path(&self.data_dir)
    }

    /// Directory and file-name prefix for numbered sub-lists.
    pub fn sublist_location(&self) -> (PathBuf, String) {
        let full = self.resolve_path(&self.sublist_prefix);
        let prefix = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = full
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.base_dir());
        (dir, prefix)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            workers: self.workers,
            sub_batch_size: self.sub_batch_size,
            sub_batch_pause: Duration::from_millis(self.sub_batch_pause_ms),
            retry: self.retry_policy(),
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.seed_list, "URL_LIST.csv");
        assert_eq!(config.include_patterns, vec!["-kft", "-bt", "-zrt"]);
        assert_eq!(config.batch_size, 10_000);
        assert_eq!(config.workers, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.validation.max_compressed_bytes, 30 * 1024);
        assert_eq!(config.mode, RunMode::Batch);
        assert!(!config.direct);
    }

    #[test]
    fn test_toml_partial_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pageharvest.toml");
        fs::write(
            &path,
            r#"
workers = 4
mode = "strict"
exclude_patterns = ["-v-a"]

[validation]
min_compressed_bytes = 2048
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.mode, RunMode::Strict);
        assert_eq!(config.exclude_patterns, vec!["-v-a"]);
        assert_eq!(config.validation.min_compressed_bytes, Some(2048));
        assert_eq!(config.validation.denied_titles, vec!["RegisterOpenUser"]);
        assert_eq!(config.batch_size, 10_000);
    }

    #[test]
    fn test_json_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pageharvest.json");
        fs::write(&path, r#"{"batch_size": 250, "direct": true}"#).unwrap();

        let config = Config::discover_in(dir.path()).unwrap();
        assert_eq!(config.batch_size, 250);
        assert!(config.direct);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_discover_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::discover_in(dir.path()).unwrap();
        assert!(config.source_path.is_none());
        assert_eq!(config.workers, 10);
    }

    #[test]
    fn test_explicit_missing_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unparsable_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "workers = [not toml").unwrap();
        assert!(Config::load(Some(&path)).unwrap_err().is_configuration());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.toml");
        fs::write(&path, "workers = 0").unwrap();
        assert!(Config::load(Some(&path)).unwrap_err().is_configuration());
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pageharvest.toml");
        fs::write(&path, "data_dir = \"out/pages\"\nsublist_prefix = \"lists/PART\"").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.data_dir_path(), dir.path().join("out/pages"));
        assert_eq!(config.seed_list_path(), dir.path().join("URL_LIST.csv"));

        let (sub_dir, prefix) = config.sublist_location();
        assert_eq!(sub_dir, dir.path().join("lists"));
        assert_eq!(prefix, "PART");
    }

    #[test]
    fn test_absolute_paths_kept() {
        let config = Config::default();
        let abs = std::env::temp_dir().join("pages");
        assert_eq!(config.resolve_path(abs.to_str().unwrap()), abs);
    }

    #[test]
    fn test_scheduler_config_from_settings() {
        let config = Config {
            workers: 3,
            sub_batch_pause_ms: 250,
            max_attempts: 2,
            ..Default::default()
        };
        let sched = config.scheduler_config();
        assert_eq!(sched.workers, 3);
        assert_eq!(sched.sub_batch_pause, Duration::from_millis(250));
        assert_eq!(sched.retry.max_attempts, 2);
    }
}
