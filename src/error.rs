//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::IndexError;
use crate::scanner::ScanError;

/// Exit codes for the deduplicate-files application.
///
/// - 0: Success (plan reported, quarantine done or declined)
/// - 1: General error (unexpected failure)
/// - 2: Usage error (missing or invalid directory argument)
/// - 3: Partial success (some files could not be scanned or moved)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the run completed normally.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Usage: the directory argument was missing or not a directory.
    Usage = 2,
    /// Partial success: completed, but some files were skipped or not moved.
    PartialSuccess = 3,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DF000",
            Self::GeneralError => "DF001",
            Self::Usage => "DF002",
            Self::PartialSuccess => "DF003",
            Self::Interrupted => "DF130",
        }
    }
}

/// Usage errors detected before any scanning starts.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// No directory argument was given.
    #[error("please provide a valid directory name")]
    MissingDirectory,

    /// The argument does not name an existing directory.
    #[error("not a valid directory: {0}")]
    InvalidDirectory(std::path::PathBuf),
}

/// Ctrl+C arrived after the scan, before or during quarantine.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("interrupted by user, no further files were moved")]
pub struct Interrupted;

/// Map a fatal error to its exit code.
///
/// Interruption wins over everything; invalid roots and missing arguments are
/// usage errors; the rest are general failures.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    for cause in err.chain() {
        if cause.downcast_ref::<Interrupted>().is_some() {
            return ExitCode::Interrupted;
        }
        if let Some(e) = cause.downcast_ref::<IndexError>() {
            return match e {
                IndexError::Interrupted => ExitCode::Interrupted,
                IndexError::ScanError(scan) if scan.is_structural() => ExitCode::Usage,
                IndexError::ScanError(_) => ExitCode::GeneralError,
            };
        }
        if let Some(scan) = cause.downcast_ref::<ScanError>() {
            if scan.is_structural() {
                return ExitCode::Usage;
            }
        }
        if cause.downcast_ref::<UsageError>().is_some() {
            return ExitCode::Usage;
        }
    }
    ExitCode::GeneralError
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
