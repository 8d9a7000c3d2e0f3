//! JSON output formatter for reclaim plans.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "sets": [
//!     {
//!       "digest": "abc123...",
//!       "size": 1024,
//!       "keep": "/path/to/keep.txt",
//!       "quarantine": ["/path/to/copy.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "files_indexed": 100,
//!     "bytes_indexed": 1048576,
//!     "duplicate_groups": 1,
//!     "files_to_quarantine": 1,
//!     "reclaimable_bytes": 1024,
//!     "reclaimable_mb": 0.001024,
//!     "failures": 0,
//!     "scan_duration_ms": 12,
//!     "interrupted": false,
//!     "dry_run": true,
//!     "exit_code": 0,
//!     "exit_code_name": "DF000"
//!   },
//!   "quarantine": {
//!     "directory": "/home/me/deduplicate-files",
//!     "moved": 1,
//!     "bytes_moved": 1024,
//!     "failures": [],
//!     "manifest": "/home/me/deduplicate-files/quarantine-manifest-...json"
//!   }
//! }
//! ```
//!
//! `quarantine` is present only when files were actually moved or attempted.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::actions::QuarantineReport;
use crate::duplicates::{DuplicateSet, IndexReport, ReclaimPlan};
use crate::error::ExitCode;

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files fingerprinted
    pub files_indexed: usize,
    /// Bytes hashed
    pub bytes_indexed: u64,
    /// Sets with two or more members
    pub duplicate_groups: usize,
    /// Length of the quarantine list
    pub files_to_quarantine: usize,
    pub reclaimable_bytes: u64,
    /// Reclaimable space in decimal megabytes
    pub reclaimable_mb: f64,
    /// Files or directories that could not be read
    pub failures: usize,
    pub scan_duration_ms: u64,
    pub interrupted: bool,
    /// Whether the run only reported
    pub dry_run: bool,
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DF000")
    pub exit_code_name: String,
}

/// A failed move in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of the quarantine step.
#[derive(Debug, Clone, Serialize)]
pub struct JsonQuarantine {
    pub directory: PathBuf,
    /// Files moved
    pub moved: usize,
    pub bytes_moved: u64,
    pub failures: Vec<JsonFailure>,
    /// Restore manifest, if one was written
    pub manifest: Option<PathBuf>,
}

impl JsonQuarantine {
    #[must_use]
    pub fn from_report(directory: &Path, report: &QuarantineReport) -> Self {
        Self {
            directory: directory.to_path_buf(),
            moved: report.success_count(),
            bytes_moved: report.bytes_moved,
            failures: report
                .failures
                .iter()
                .map(|(path, error)| JsonFailure {
                    path: path.clone(),
                    error: error.clone(),
                })
                .collect(),
            manifest: report.manifest.clone(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Duplicate sets, largest reclaim first
    pub sets: &'a [DuplicateSet],
    pub summary: JsonSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine: Option<JsonQuarantine>,
}

impl<'a> JsonOutput<'a> {
    #[must_use]
    pub fn new(
        plan: &'a ReclaimPlan,
        report: &IndexReport,
        dry_run: bool,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            sets: &plan.sets,
            summary: JsonSummary {
                files_indexed: report.files_indexed,
                bytes_indexed: report.bytes_indexed,
                duplicate_groups: plan.duplicate_groups,
                files_to_quarantine: plan.quarantine.len(),
                reclaimable_bytes: plan.reclaimable_bytes,
                reclaimable_mb: plan.reclaimable_megabytes(),
                failures: report.failures.len(),
                scan_duration_ms: report.duration.as_millis() as u64,
                interrupted: report.interrupted || exit_code == ExitCode::Interrupted,
                dry_run,
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
            quarantine: None,
        }
    }

    /// Attach the result of the quarantine step.
    #[must_use]
    pub fn with_quarantine(mut self, directory: &Path, report: &QuarantineReport) -> Self {
        self.quarantine = Some(JsonQuarantine::from_report(directory, report));
        self
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        pretty: bool,
    ) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
