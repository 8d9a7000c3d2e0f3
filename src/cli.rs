//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates under ~/Downloads and ask before moving anything
//! deduplicate-files ~/Downloads
//!
//! # Report only, as JSON
//! deduplicate-files ~/Downloads --dry-run --output json
//!
//! # Keep the oldest copy, move the rest without asking
//! deduplicate-files ~/Photos --keep oldest --yes
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::duplicates::KeepPolicy;

/// Find files with identical content and move the extra copies aside.
///
/// Every regular file under DIRECTORY is fingerprinted with BLAKE3. For each
/// group of identical files one copy is kept and the others are moved, after
/// confirmation, into a quarantine directory (default ~/deduplicate-files).
/// Nothing is ever deleted.
#[derive(Debug, Parser)]
#[command(name = "deduplicate-files")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for duplicates
    #[arg(value_name = "DIRECTORY")]
    pub path: Option<PathBuf>,

    /// Increase verbosity level (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Move duplicates without prompting
    #[arg(short, long, conflicts_with = "dry_run")]
    pub yes: bool,

    /// Report what would be moved, never prompt or move
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Which copy of each duplicate set survives
    #[arg(long, value_enum, value_name = "POLICY")]
    pub keep: Option<KeepPolicy>,

    /// Quarantine directory (default: ~/deduplicate-files)
    #[arg(long, value_name = "PATH", env = "DEDUPLICATE_FILES_QUARANTINE_DIR")]
    pub quarantine_dir: Option<PathBuf>,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Number of I/O threads for traversal and hashing (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MB, 1GiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Abort on the first file that cannot be read instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Store the given --keep, --quarantine-dir and --io-threads as defaults
    #[arg(long)]
    pub save_config: bool,
}

/// Summary output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary and file list
    #[default]
    Text,
    /// Machine-readable JSON on stdout
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size such as `10MB` or `1.5GiB` into bytes.
///
/// Decimal suffixes (KB, MB, GB, TB) are powers of 1000, binary suffixes
/// (KiB, MiB, GiB, TiB) powers of 1024. Suffixes are case-insensitive.
///
/// # Errors
///
/// Returns a message suitable for clap when the input is empty or malformed.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    s.parse::<bytesize::ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}
