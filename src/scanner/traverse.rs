//! Recursive directory traversal on top of [`jwalk`].
//!
//! # Overview
//!
//! [`Traverser::traverse`] walks a directory tree and calls a visitor once
//! for every regular file. jwalk reads directories on its own rayon pool and
//! yields entries sorted by name within each directory; the entries are
//! bridged onto the current rayon pool where the visitor runs. Every entry
//! produces a [`TraversalReport`] and the reports are reduced into one, so the
//! call returns only after every visit is done and no failure is lost.
//!
//! Symbolic links are never followed. Links and special files (sockets,
//! FIFOs, devices) are skipped.
//!
//! # Example
//!
//! ```no_run
//! use deduplicate_files::scanner::{TraverseConfig, Traverser};
//! use std::path::Path;
//!
//! let traverser = Traverser::new(Path::new("."), TraverseConfig::default());
//! let report = traverser
//!     .traverse(&|record| {
//!         println!("{}", record.path.display());
//!         Ok(())
//!     })
//!     .unwrap();
//! assert!(report.is_clean());
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;

use super::{FileRecord, ScanError, TraverseConfig};

/// Outcome of a traversal.
#[derive(Debug, Default)]
pub struct TraversalReport {
    /// Files handed to the visitor that it accepted
    pub files_visited: usize,
    /// Directories listed, including the root
    pub directories: usize,
    /// Entries skipped by size filters, links or special-file checks.
    /// Hidden entries are pruned by the walker and not counted.
    pub skipped: usize,
    /// Failures from unreadable directories, entries and visitor calls
    pub failures: Vec<ScanError>,
    /// Whether work was abandoned because of shutdown or fail-fast
    pub interrupted: bool,
}

impl TraversalReport {
    fn failed(error: ScanError) -> Self {
        Self {
            failures: vec![error],
            ..Self::default()
        }
    }

    fn skipped() -> Self {
        Self {
            skipped: 1,
            ..Self::default()
        }
    }

    /// Combine two partial reports.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.files_visited += other.files_visited;
        self.directories += other.directories;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
        self.interrupted |= other.interrupted;
        self
    }

    /// True if no failure was recorded and the walk ran to completion.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }
}

/// Parallel directory walker.
#[derive(Debug)]
pub struct Traverser {
    root: PathBuf,
    config: TraverseConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
    aborted: AtomicBool,
}

impl Traverser {
    /// Create a traverser rooted at `path`.
    #[must_use]
    pub fn new(path: &Path, config: TraverseConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            aborted: AtomicBool::new(false),
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// Once set, no further entries are pulled from the walker and no new
    /// visitor calls are started.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn should_stop(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
            || self
                .shutdown_flag
                .as_ref()
                .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, calling `visitor` for every regular file.
    ///
    /// Visitor calls run concurrently on the current rayon pool. A visitor
    /// error is recorded in the report and does not stop sibling work unless
    /// [`TraverseConfig::fail_fast`] is set.
    ///
    /// # Errors
    ///
    /// Fails before visiting anything if the root does not exist
    /// (`NotFound`), is not a directory (`NotADirectory`) or its metadata
    /// cannot be read.
    pub fn traverse<V>(&self, visitor: &V) -> Result<TraversalReport, ScanError>
    where
        V: Fn(&FileRecord) -> Result<(), ScanError> + Sync,
    {
        let metadata =
            fs::metadata(&self.root).map_err(|e| ScanError::from_io(self.root.clone(), e))?;
        if !metadata.is_dir() {
            log::error!("Can not traverse, not a directory: {}", self.root.display());
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        log::debug!("Traversing {}", self.root.display());

        // Directory reads get their own pool so a visitor pool of one thread
        // cannot starve the walker.
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .sort(true)
            .parallelism(Parallelism::RayonNewPool(rayon::current_num_threads()));

        let mut report = walk_dir
            .into_iter()
            .take_while(|_| !self.should_stop())
            .par_bridge()
            .map(|entry| match entry {
                Ok(entry) => self.visit_entry(entry.path(), entry.file_type(), visitor),
                Err(e) => TraversalReport::failed(self.handle_jwalk_error(e)),
            })
            .reduce(TraversalReport::default, TraversalReport::merge);

        if self.should_stop() {
            log::debug!("Traversal stopped before completion");
            report.interrupted = true;
        }

        log::debug!(
            "Traversal complete: {} files in {} directories, {} skipped, {} failures",
            report.files_visited,
            report.directories,
            report.skipped,
            report.failures.len()
        );
        Ok(report)
    }

    fn visit_entry<V>(
        &self,
        path: PathBuf,
        file_type: fs::FileType,
        visitor: &V,
    ) -> TraversalReport
    where
        V: Fn(&FileRecord) -> Result<(), ScanError> + Sync,
    {
        if self.should_stop() {
            return TraversalReport {
                interrupted: true,
                ..TraversalReport::default()
            };
        }

        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", path.display());
            return TraversalReport::skipped();
        }

        if file_type.is_dir() {
            return TraversalReport {
                directories: 1,
                ..TraversalReport::default()
            };
        }

        if !file_type.is_file() {
            log::trace!("Skipping special file: {}", path.display());
            return TraversalReport::skipped();
        }

        let size = match fs::symlink_metadata(&path) {
            Ok(m) => m.len(),
            Err(e) => {
                log::warn!("Cannot read metadata for {}: {}", path.display(), e);
                return TraversalReport::failed(ScanError::from_io(path, e));
            }
        };

        if !self.config.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return TraversalReport::skipped();
        }

        let record = FileRecord::new(path, size);
        match visitor(&record) {
            Ok(()) => TraversalReport {
                files_visited: 1,
                ..TraversalReport::default()
            },
            Err(e) => {
                if self.config.fail_fast {
                    self.aborted.store(true, Ordering::SeqCst);
                }
                TraversalReport::failed(e)
            }
        }
    }

    /// Map a walker error (unreadable directory or entry) into a [`ScanError`].
    fn handle_jwalk_error(&self, error: jwalk::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Walker error for {}: {}", path.display(), error);

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
            Some(ErrorKind::NotFound) => ScanError::NotFound(path),
            _ => ScanError::Io {
                path,
                source: std::io::Error::other(error.to_string()),
            },
        }
    }
}
