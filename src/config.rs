//! Persistent defaults.
//!
//! A small JSON file in the platform config directory can preset the keep
//! policy, the quarantine directory and the I/O thread count. Command-line
//! flags always win. A missing or unreadable file means built-in defaults.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::duplicates::KeepPolicy;

/// Default number of I/O threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Survivor policy when `--keep` is not given.
    pub keep: Option<KeepPolicy>,
    /// Quarantine directory when `--quarantine-dir` is not given.
    pub quarantine_dir: Option<PathBuf>,
    /// I/O threads when `--io-threads` is not given.
    pub io_threads: Option<usize>,
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    pub fn load() -> Self {
        match Self::config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit path; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Copy every value given on the command line over the stored one.
    #[must_use]
    pub fn with_overrides(
        mut self,
        keep: Option<KeepPolicy>,
        quarantine_dir: Option<PathBuf>,
        io_threads: Option<usize>,
    ) -> Self {
        if keep.is_some() {
            self.keep = keep;
        }
        if quarantine_dir.is_some() {
            self.quarantine_dir = quarantine_dir;
        }
        if io_threads.is_some() {
            self.io_threads = io_threads;
        }
        self
    }

    /// Save the configuration to the default platform-specific path.
    ///
    /// # Errors
    ///
    /// If the config directory cannot be determined or written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save to an explicit path, creating parent directories.
    ///
    /// # Errors
    ///
    /// I/O or serialization failures.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// When no home directory can be determined.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "deduplicate-files", "deduplicate-files")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }

    /// Effective keep policy given the command-line value.
    #[must_use]
    pub fn keep_or(&self, cli: Option<KeepPolicy>) -> KeepPolicy {
        cli.or(self.keep).unwrap_or_default()
    }

    /// Effective thread count given the command-line value.
    #[must_use]
    pub fn io_threads_or(&self, cli: Option<usize>) -> usize {
        cli.or(self.io_threads)
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_IO_THREADS)
    }

    /// Effective quarantine directory given the command-line value.
    #[must_use]
    pub fn quarantine_dir_or(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.quarantine_dir.clone())
    }
}
