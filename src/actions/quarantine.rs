//! Quarantine: move duplicates aside instead of deleting them.
//!
//! # Overview
//!
//! The [`QuarantineExecutor`] relocates every path on a quarantine list into
//! one holding directory (by default `~/deduplicate-files`). Each file is
//! renamed `<ordinal>_<basename>`, the ordinal being its position in the
//! list, so identically named files from different directories never
//! collide.
//!
//! # Safety
//!
//! Nothing is ever deleted. A move links the file under its new name and then
//! unlinks the old one, so an existing destination is never overwritten. On
//! filesystems without hard links it falls back to a plain rename. Each move is
//! independent: one failure is recorded and the remaining files are still
//! moved. After the batch a JSON manifest mapping every quarantined file back
//! to its original location is written next to the files.
//!
//! # Example
//!
//! ```no_run
//! use deduplicate_files::actions::quarantine::{NoProgress, QuarantineExecutor};
//! use std::path::PathBuf;
//!
//! let executor = QuarantineExecutor::new(PathBuf::from("/tmp/quarantine"));
//! let files = vec![PathBuf::from("/data/copy.txt")];
//! let report = executor.execute::<NoProgress>(&files, None).unwrap();
//! println!("{}", report.summary());
//! ```

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duplicates::ReclaimPlan;

/// Directory name created under the home directory.
pub const QUARANTINE_DIR_NAME: &str = "deduplicate-files";

/// Prefix of the manifest files written after each batch.
pub const MANIFEST_PREFIX: &str = "quarantine-manifest";

/// Default quarantine location: `<home>/deduplicate-files`.
#[must_use]
pub fn default_quarantine_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(QUARANTINE_DIR_NAME))
}

/// Error type for quarantine operations.
#[derive(Debug, Error)]
pub enum QuarantineError {
    /// Source file was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied reading the source or writing the destination.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The quarantine directory could not be created.
    #[error("cannot create quarantine directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source and quarantine directory live on different filesystems.
    #[error("cannot move {path} to {destination}: different filesystems")]
    CrossDevice { path: PathBuf, destination: PathBuf },

    /// The destination name is already taken.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// The source path has no file name component.
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),

    /// The plan would quarantine every copy of some group.
    #[error("refusing to quarantine all copies of {0}")]
    AllCopiesWouldBeMoved(PathBuf),

    /// The restore manifest could not be written.
    #[error("failed to write manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl QuarantineError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::DestinationExists(p)
            | Self::NoFileName(p)
            | Self::AllCopiesWouldBeMoved(p)
            | Self::CreateDir { path: p, .. }
            | Self::CrossDevice { path: p, .. }
            | Self::Manifest { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// A file that was moved into quarantine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantinedFile {
    /// Position in the quarantine list
    pub ordinal: usize,
    /// Where the file used to live
    pub original: PathBuf,
    /// Where it lives now
    pub quarantined: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// Restore manifest written into the quarantine directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarantineManifest {
    /// When the batch ran
    pub created_at: DateTime<Utc>,
    /// Every successful move in the batch
    pub entries: Vec<QuarantinedFile>,
}

/// Results of a quarantine batch.
#[derive(Debug, Clone, Default)]
pub struct QuarantineReport {
    /// Successfully moved files.
    pub successes: Vec<QuarantinedFile>,
    /// Failed moves with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes moved.
    pub bytes_moved: u64,
    /// Manifest written for this batch, if any file was moved.
    pub manifest: Option<PathBuf>,
    /// Whether the batch stopped early on a shutdown request.
    pub interrupted: bool,
}

impl QuarantineReport {
    /// Number of files moved.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed moves.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every move succeeded and none was skipped.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.interrupted {
            format!(
                "Interrupted after {} file(s), {} failed, {} moved",
                self.success_count(),
                self.failure_count(),
                bytesize::ByteSize::b(self.bytes_moved)
            )
        } else if self.all_succeeded() {
            format!(
                "Quarantined {} file(s), {} moved",
                self.success_count(),
                bytesize::ByteSize::b(self.bytes_moved)
            )
        } else {
            format!(
                "Quarantined {} file(s), {} failed, {} moved",
                self.success_count(),
                self.failure_count(),
                bytesize::ByteSize::b(self.bytes_moved)
            )
        }
    }
}

/// Callback trait for quarantine progress reporting.
pub trait QuarantineProgressCallback: Send + Sync {
    /// Called before each move.
    fn on_before_move(&self, path: &Path, index: usize, total: usize);

    /// Called after a successful move.
    fn on_move_success(&self, path: &Path, size: u64);

    /// Called after a failed move.
    fn on_move_failure(&self, path: &Path, error: &str);

    /// Called when the batch completes.
    fn on_complete(&self, report: &QuarantineReport);
}

/// Callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl QuarantineProgressCallback for NoProgress {
    fn on_before_move(&self, _: &Path, _: usize, _: usize) {}
    fn on_move_success(&self, _: &Path, _: u64) {}
    fn on_move_failure(&self, _: &Path, _: &str) {}
    fn on_complete(&self, _: &QuarantineReport) {}
}

/// Moves files into a quarantine directory.
#[derive(Debug, Clone)]
pub struct QuarantineExecutor {
    directory: PathBuf,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl QuarantineExecutor {
    /// Create an executor targeting `directory`.
    #[must_use]
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag. Once it is raised no further file is moved.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// The quarantine directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Create the quarantine directory if it does not exist.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` if creation is refused, `CreateDir` otherwise.
    pub fn ensure_directory(&self) -> Result<(), QuarantineError> {
        if self.directory.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.directory).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => {
                QuarantineError::PermissionDenied(self.directory.clone())
            }
            _ => QuarantineError::CreateDir {
                path: self.directory.clone(),
                source: e,
            },
        })?;
        log::info!("Created quarantine directory {}", self.directory.display());
        Ok(())
    }

    /// Destination path for the file at `ordinal` in the list.
    ///
    /// # Errors
    ///
    /// `NoFileName` if `path` ends in `..` or is a root.
    pub fn destination(&self, ordinal: usize, path: &Path) -> Result<PathBuf, QuarantineError> {
        let basename = path
            .file_name()
            .ok_or_else(|| QuarantineError::NoFileName(path.to_path_buf()))?;
        let mut name = OsString::from(format!("{ordinal}_"));
        name.push(basename);
        Ok(self.directory.join(name))
    }

    /// Move one file into quarantine.
    ///
    /// # Errors
    ///
    /// - `NotFound` / `PermissionDenied` for the source
    /// - `DestinationExists` if the target name is taken
    /// - `CrossDevice` if the move would cross filesystems
    pub fn move_one(&self, ordinal: usize, path: &Path) -> Result<QuarantinedFile, QuarantineError> {
        let metadata = fs::symlink_metadata(path).map_err(|e| QuarantineError::from_io(path, e))?;
        let destination = self.destination(ordinal, path)?;

        match fs::hard_link(path, &destination) {
            Ok(()) => {
                if let Err(e) = fs::remove_file(path) {
                    // Leave the original where it was
                    let _ = fs::remove_file(&destination);
                    return Err(QuarantineError::from_io(path, e));
                }
            }
            Err(e) => match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    return Err(QuarantineError::DestinationExists(destination));
                }
                io::ErrorKind::CrossesDevices => {
                    return Err(cross_device(path, &destination));
                }
                io::ErrorKind::NotFound => return Err(QuarantineError::from_io(path, e)),
                _ => {
                    log::debug!(
                        "Hard link unavailable for {} ({}), renaming instead",
                        path.display(),
                        e
                    );
                    // Not atomic: a destination created between the check and
                    // the rename would be replaced.
                    if fs::symlink_metadata(&destination).is_ok() {
                        return Err(QuarantineError::DestinationExists(destination));
                    }
                    fs::rename(path, &destination).map_err(|e| match e.kind() {
                        io::ErrorKind::CrossesDevices => cross_device(path, &destination),
                        _ => QuarantineError::from_io(path, e),
                    })?;
                }
            },
        }

        log::info!(
            "Quarantined: {} -> {} ({} bytes)",
            path.display(),
            destination.display(),
            metadata.len()
        );

        Ok(QuarantinedFile {
            ordinal,
            original: path.to_path_buf(),
            quarantined: destination,
            size: metadata.len(),
        })
    }

    /// Move every path in `paths`, continuing past failures.
    ///
    /// # Errors
    ///
    /// Only when the quarantine directory itself cannot be created. Per-file
    /// failures are recorded in the report.
    pub fn execute<C: QuarantineProgressCallback>(
        &self,
        paths: &[PathBuf],
        callback: Option<&C>,
    ) -> Result<QuarantineReport, QuarantineError> {
        self.ensure_directory()?;

        let mut report = QuarantineReport::default();
        let total = paths.len();

        for (ordinal, path) in paths.iter().enumerate() {
            if self.is_shutdown_requested() {
                log::warn!(
                    "Shutdown requested, {} file(s) left in place",
                    total - ordinal
                );
                report.interrupted = true;
                break;
            }

            if let Some(cb) = callback {
                cb.on_before_move(path, ordinal, total);
            }

            match self.move_one(ordinal, path) {
                Ok(moved) => {
                    report.bytes_moved += moved.size;
                    if let Some(cb) = callback {
                        cb.on_move_success(path, moved.size);
                    }
                    report.successes.push(moved);
                }
                Err(e) => {
                    let message = e.to_string();
                    log::warn!("Failed to quarantine {}: {}", path.display(), message);
                    if let Some(cb) = callback {
                        cb.on_move_failure(path, &message);
                    }
                    report.failures.push((path.clone(), message));
                }
            }
        }

        if !report.successes.is_empty() {
            match self.write_manifest(&report.successes) {
                Ok(manifest) => report.manifest = Some(manifest),
                Err(e) => log::error!("{}", e),
            }
        }

        if let Some(cb) = callback {
            cb.on_complete(&report);
        }

        log::info!("{}", report.summary());

        Ok(report)
    }

    /// Validate `plan` and quarantine its list.
    ///
    /// # Errors
    ///
    /// `AllCopiesWouldBeMoved` if some set has its kept copy on the list,
    /// otherwise as [`execute`](Self::execute).
    pub fn execute_plan<C: QuarantineProgressCallback>(
        &self,
        plan: &ReclaimPlan,
        callback: Option<&C>,
    ) -> Result<QuarantineReport, QuarantineError> {
        validate_preserves_copy(plan)?;
        self.execute(&plan.quarantine, callback)
    }

    fn write_manifest(&self, entries: &[QuarantinedFile]) -> Result<PathBuf, QuarantineError> {
        let created_at = Utc::now();
        let path = self.directory.join(format!(
            "{}-{}.json",
            MANIFEST_PREFIX,
            created_at.format("%Y%m%dT%H%M%S%.3fZ")
        ));
        let manifest = QuarantineManifest {
            created_at,
            entries: entries.to_vec(),
        };

        let content = serde_json::to_string_pretty(&manifest).map_err(|e| {
            QuarantineError::Manifest {
                path: path.clone(),
                source: io::Error::other(e),
            }
        })?;
        fs::write(&path, content).map_err(|e| QuarantineError::Manifest {
            path: path.clone(),
            source: e,
        })?;

        log::debug!("Wrote quarantine manifest {}", path.display());
        Ok(path)
    }
}

fn cross_device(path: &Path, destination: &Path) -> QuarantineError {
    QuarantineError::CrossDevice {
        path: path.to_path_buf(),
        destination: destination.to_path_buf(),
    }
}

/// Check that no set in `plan` would lose its last copy.
///
/// # Errors
///
/// `AllCopiesWouldBeMoved` naming the kept path that is also listed.
pub fn validate_preserves_copy(plan: &ReclaimPlan) -> Result<(), QuarantineError> {
    let listed: HashSet<&PathBuf> = plan.quarantine.iter().collect();
    for set in &plan.sets {
        if listed.contains(&set.keep) {
            log::error!(
                "Kept copy {} is also listed for quarantine",
                set.keep.display()
            );
            return Err(QuarantineError::AllCopiesWouldBeMoved(set.keep.clone()));
        }
    }
    Ok(())
}
