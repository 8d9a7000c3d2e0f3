//! Fingerprint index: files grouped by content digest.
//!
//! # Overview
//!
//! The [`IndexBuilder`] is the visitor handed to the
//! [`Traverser`](crate::scanner::Traverser). For every file it computes a
//! [`Fingerprint`](crate::scanner::Fingerprint) and appends the path to the
//! [`FingerprintGroup`] for that digest, creating the group on first sight.
//!
//! Visitor calls arrive concurrently from sibling directory branches. The
//! digest→group map sits behind a single mutex and the lookup plus
//! insert-or-append happens under one lock acquisition, so two concurrent
//! first sightings of a digest always land in the same group. Hashing itself
//! runs outside the lock.
//!
//! # Example
//!
//! ```no_run
//! use deduplicate_files::duplicates::{build_index, IndexConfig};
//! use std::path::Path;
//!
//! let (index, report) = build_index(Path::new("."), IndexConfig::default()).unwrap();
//! println!(
//!     "{} files indexed into {} groups ({} failures)",
//!     report.files_indexed,
//!     index.len(),
//!     report.failures.len()
//! );
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::progress::ProgressCallback;
use crate::scanner::{Digest, FileRecord, Fingerprinter, ScanError, TraverseConfig, Traverser};

/// All discovered files sharing one digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintGroup {
    /// Size in bytes shared by every member
    pub size: u64,
    /// Member paths in discovery order
    pub members: Vec<PathBuf>,
}

impl FingerprintGroup {
    /// Create a group holding its first member.
    #[must_use]
    pub fn new(size: u64, first: PathBuf) -> Self {
        Self {
            size,
            members: vec![first],
        }
    }

    /// Append a later member.
    pub fn push(&mut self, path: PathBuf) {
        self.members.push(path);
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// A group with two or more members is a duplicate set.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.members.len() > 1
    }

    /// Bytes freed by removing all copies but one.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        (self.members.len().saturating_sub(1) as u64).saturating_mul(self.size)
    }
}

/// Completed digest→group mapping.
#[derive(Debug, Clone, Default)]
pub struct FingerprintIndex {
    groups: HashMap<Digest, FingerprintGroup>,
}

impl FingerprintIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `path` under `digest`, creating the group on first occurrence.
    ///
    /// The group keeps the size captured at creation.
    pub fn insert(&mut self, digest: Digest, size: u64, path: PathBuf) {
        match self.groups.get_mut(&digest) {
            Some(group) => {
                debug_assert_eq!(
                    group.size, size,
                    "size mismatch for identical digest: {}",
                    path.display()
                );
                group.push(path);
            }
            None => {
                self.groups.insert(digest, FingerprintGroup::new(size, path));
            }
        }
    }

    /// Look up the group for a digest.
    #[must_use]
    pub fn get(&self, digest: &Digest) -> Option<&FingerprintGroup> {
        self.groups.get(digest)
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of indexed files across all groups.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.groups.values().map(FingerprintGroup::len).sum()
    }

    /// Reorder every group's members by path.
    ///
    /// Parallel discovery order varies between runs; sorted order does not.
    pub fn sort_members(&mut self) {
        for group in self.groups.values_mut() {
            group.members.sort();
        }
    }

    /// Iterate over `(digest, group)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Digest, &FingerprintGroup)> {
        self.groups.iter()
    }

    /// Iterate over groups with two or more members.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = (&Digest, &FingerprintGroup)> {
        self.groups.iter().filter(|(_, g)| g.is_duplicate())
    }
}

/// Configuration for index building.
#[derive(Clone)]
pub struct IndexConfig {
    /// Threads in the pool used for traversal and hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Abort the scan on the first file that cannot be fingerprinted.
    pub strict: bool,
    /// Traversal filters.
    pub traverse: TraverseConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("io_threads", &self.io_threads)
            .field("strict", &self.strict)
            .field("traverse", &self.traverse)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            strict: false,
            traverse: TraverseConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl IndexConfig {
    /// Set the pool size.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Enable or disable strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the traversal filters.
    #[must_use]
    pub fn with_traverse_config(mut self, config: TraverseConfig) -> Self {
        self.traverse = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from one index build.
#[derive(Debug, Default)]
pub struct IndexReport {
    /// Files fingerprinted and inserted
    pub files_indexed: usize,
    /// Bytes hashed across indexed files
    pub bytes_indexed: u64,
    /// Directories read
    pub directories: usize,
    /// Entries skipped by size filters, links or special-file checks
    pub skipped: usize,
    /// Per-file and per-directory failures (skipped, not fatal)
    pub failures: Vec<ScanError>,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// Wall time for traversal plus hashing
    pub duration: Duration,
}

impl IndexReport {
    /// True if every discovered file made it into the index.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.interrupted
    }
}

/// Errors that end an index build.
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The root was invalid, or strict mode hit a per-file failure.
    #[error(transparent)]
    ScanError(#[from] ScanError),
}

/// Concurrent visitor that fills a [`FingerprintIndex`].
pub struct IndexBuilder {
    fingerprinter: Fingerprinter,
    index: Mutex<FingerprintIndex>,
    files_indexed: AtomicUsize,
    bytes_indexed: AtomicU64,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl IndexBuilder {
    /// Create a builder with an empty index.
    #[must_use]
    pub fn new(fingerprinter: Fingerprinter) -> Self {
        Self {
            fingerprinter,
            index: Mutex::new(FingerprintIndex::new()),
            files_indexed: AtomicUsize::new(0),
            bytes_indexed: AtomicU64::new(0),
            progress_callback: None,
        }
    }

    /// Report each indexed file to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Fingerprint one file and insert it.
    ///
    /// Safe to call from many threads at once.
    ///
    /// # Errors
    ///
    /// Returns the fingerprinting failure; the index is left untouched.
    pub fn visit(&self, record: &FileRecord) -> Result<(), ScanError> {
        let fingerprint = match self.fingerprinter.fingerprint(&record.path) {
            Ok(fp) => fp,
            Err(e) => {
                log::warn!("Skipping {}: {}", record.path.display(), e);
                return Err(e.into());
            }
        };

        {
            let mut index = self.index.lock().unwrap_or_else(PoisonError::into_inner);
            index.insert(fingerprint.digest, fingerprint.size, record.path.clone());
        }

        let count = self.files_indexed.fetch_add(1, Ordering::Relaxed) + 1;
        self.bytes_indexed
            .fetch_add(fingerprint.size, Ordering::Relaxed);

        if let Some(ref callback) = self.progress_callback {
            callback.on_progress(count, record.path.to_string_lossy().as_ref());
            callback.on_item_completed(fingerprint.size);
        }

        Ok(())
    }

    /// Number of files indexed so far.
    #[must_use]
    pub fn files_indexed(&self) -> usize {
        self.files_indexed.load(Ordering::Relaxed)
    }

    /// Bytes hashed so far.
    #[must_use]
    pub fn bytes_indexed(&self) -> u64 {
        self.bytes_indexed.load(Ordering::Relaxed)
    }

    /// Release the index once no more visits can arrive.
    #[must_use]
    pub fn finish(self) -> FingerprintIndex {
        self.index
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Traverse `root` and build its fingerprint index.
///
/// Per-file failures are logged, collected into the [`IndexReport`] and the
/// file is left out of the index.
///
/// # Errors
///
/// - `ScanError` if the root is missing or not a directory
/// - `ScanError` for the first per-file failure when `strict` is set
/// - `Interrupted` if the shutdown flag was raised
pub fn build_index(
    root: &Path,
    config: IndexConfig,
) -> Result<(FingerprintIndex, IndexReport), IndexError> {
    let start = Instant::now();

    let mut fingerprinter = Fingerprinter::new();
    let mut traverser = Traverser::new(
        root,
        config.traverse.clone().with_fail_fast(config.strict),
    );
    if let Some(ref flag) = config.shutdown_flag {
        fingerprinter = fingerprinter.with_shutdown_flag(Arc::clone(flag));
        traverser = traverser.with_shutdown_flag(Arc::clone(flag));
    }

    let mut builder = IndexBuilder::new(fingerprinter);
    if let Some(ref callback) = config.progress_callback {
        builder = builder.with_progress_callback(Arc::clone(callback));
        callback.on_phase_start("index", 0);
    }

    log::info!("Scanning {}", root.display());

    let visitor = |record: &FileRecord| builder.visit(record);
    let traversal = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads)
        .build()
    {
        Ok(pool) => pool.install(|| traverser.traverse(&visitor)),
        Err(e) => {
            log::warn!(
                "Failed to create thread pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            traverser.traverse(&visitor)
        }
    };

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("index");
    }

    let traversal = traversal?;

    let mut report = IndexReport {
        files_indexed: builder.files_indexed(),
        bytes_indexed: builder.bytes_indexed(),
        directories: traversal.directories,
        skipped: traversal.skipped,
        failures: traversal.failures,
        interrupted: traversal.interrupted,
        duration: start.elapsed(),
    };

    if config.is_shutdown_requested() {
        log::info!("Scan interrupted by shutdown signal");
        return Err(IndexError::Interrupted);
    }

    if config.strict && !report.failures.is_empty() {
        let first = report.failures.swap_remove(0);
        log::error!("Strict mode: aborting scan after failure: {}", first);
        return Err(IndexError::ScanError(first));
    }

    let mut index = builder.finish();
    index.sort_members();

    log::info!(
        "Indexed {} files ({} bytes) into {} groups in {:?}, {} failures",
        report.files_indexed,
        report.bytes_indexed,
        index.len(),
        report.duration,
        report.failures.len()
    );

    Ok((index, report))
}
