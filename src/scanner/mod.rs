//! Scanner module for directory traversal and file fingerprinting.
//!
//! This module provides functionality for:
//! - Structured parallel directory traversal on the rayon pool
//! - Content fingerprinting with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`traverse`]: Recursive directory traversal and per-file visiting
//! - [`fingerprint`]: BLAKE3 content digest and size of a single file
//!
//! # Example
//!
//! ```no_run
//! use deduplicate_files::scanner::{Fingerprinter, TraverseConfig, Traverser};
//! use std::path::Path;
//!
//! let fingerprinter = Fingerprinter::new();
//! let traverser = Traverser::new(Path::new("."), TraverseConfig::default());
//!
//! let report = traverser
//!     .traverse(&|record| {
//!         let fp = fingerprinter.fingerprint(&record.path)?;
//!         println!("{} {}", fp.digest_hex(), record.path.display());
//!         Ok(())
//!     })
//!     .unwrap();
//! println!("{} files, {} failures", report.files_visited, report.failures.len());
//! ```

pub mod fingerprint;
pub mod traverse;

use std::path::PathBuf;

pub use fingerprint::{hash_to_hex, Digest, Fingerprint, Fingerprinter};
pub use traverse::{TraversalReport, Traverser};

/// A regular file discovered during traversal.
///
/// Ephemeral: created by the [`Traverser`] and handed straight to the visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Full path to the file (root joined with the relative location)
    pub path: PathBuf,
    /// File size in bytes as reported by the directory entry metadata
    pub size: u64,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for directory traversal.
#[derive(Debug, Clone, Default)]
pub struct TraverseConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Stop scheduling new work after the first visitor failure.
    pub fail_fast: bool,
}

impl TraverseConfig {
    /// Create a new configuration from CLI arguments.
    #[must_use]
    pub fn new(skip_hidden: bool, min_size: Option<u64>, max_size: Option<u64>) -> Self {
        Self {
            skip_hidden,
            min_size,
            max_size,
            fail_fast: false,
        }
    }

    /// Enable or disable stopping on the first visitor failure.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Check if a file size passes the configured filters.
    #[must_use]
    pub fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.max_size {
            if size > max {
                return false;
            }
        }
        true
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file or directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file could not be fingerprinted.
    #[error(transparent)]
    HashError(#[from] HashError),
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }

    /// Whether this error concerns the scan root rather than a single entry.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::NotADirectory(_))
    }
}

/// Errors that can occur during file fingerprinting.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing was abandoned because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}
