//! deduplicate-files - find identical files and move the extra copies aside.
//!
//! One run is a straight pipeline:
//!
//! 1. [`scanner::Traverser`] walks the tree in parallel on a bounded rayon pool
//! 2. [`duplicates::IndexBuilder`] fingerprints each file (BLAKE3) and groups
//!    paths by digest
//! 3. [`duplicates::resolve`] picks one survivor per group and totals the
//!    reclaimable space
//! 4. an [`actions::Confirmation`] decides whether to proceed
//! 5. [`actions::QuarantineExecutor`] moves the rest into the quarantine
//!    directory
//!
//! Nothing is ever deleted.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{
    default_quarantine_dir, AutoConfirm, Confirmation, PromptConfirmation, QuarantineExecutor,
    QuarantineReport,
};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{build_index, resolve, IndexConfig, IndexReport, ReclaimPlan};
use crate::error::{ExitCode, Interrupted, UsageError};
use crate::output::{JsonOutput, TextSummary};
use crate::progress::Progress;
use crate::scanner::TraverseConfig;
use crate::signal::ShutdownHandler;

/// Entry point used by the binary: sets up logging, Ctrl+C and the config
/// file, then runs against the real terminal.
///
/// With `--save-config` the given defaults are stored first; without a
/// directory argument that is all the run does.
///
/// # Errors
///
/// Fatal errors only: missing or invalid directory, interruption, strict-mode
/// scan failures and an unusable quarantine directory.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let shutdown = signal::install_handler();
    let mut config = Config::load();

    if cli.save_config {
        config = config.with_overrides(
            cli.keep,
            cli.quarantine_dir.clone(),
            cli.io_threads.map(usize::from),
        );
        config.save().context("saving defaults")?;
        log::info!("Saved defaults to the config file");
        if cli.path.is_none() {
            return Ok(ExitCode::Success);
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.yes || cli.dry_run {
        let mut confirmation = AutoConfirm(cli.yes);
        run_with(&cli, &config, &shutdown, &mut confirmation, &mut out)
    } else {
        let mut confirmation =
            PromptConfirmation::stdio().with_plan_summary(cli.output == OutputFormat::Json);
        run_with(&cli, &config, &shutdown, &mut confirmation, &mut out)
    }
}

/// Run one scan-plan-confirm-quarantine cycle.
///
/// The plan is written to `out` before `confirmation` is asked, so an empty
/// plan still reaches the prompt. A dry run never asks and never moves. A
/// shutdown request raised while waiting for the answer cancels the run, and
/// one raised during the moves stops the batch after the current file.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with(
    cli: &Cli,
    config: &Config,
    shutdown: &ShutdownHandler,
    confirmation: &mut dyn Confirmation,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let root = cli.path.as_deref().ok_or(UsageError::MissingDirectory)?;
    if !root.is_dir() {
        return Err(UsageError::InvalidDirectory(root.to_path_buf()).into());
    }

    let progress = Arc::new(Progress::new(
        cli.quiet || cli.output == OutputFormat::Json,
    ));
    let index_config = IndexConfig::default()
        .with_io_threads(config.io_threads_or(cli.io_threads.map(usize::from)))
        .with_strict(cli.strict)
        .with_traverse_config(TraverseConfig::new(
            cli.skip_hidden,
            cli.min_size,
            cli.max_size,
        ))
        .with_shutdown_flag(shutdown.get_flag())
        .with_progress_callback(progress.clone());

    let (index, report) = build_index(root, index_config)
        .with_context(|| format!("scanning {}", root.display()))?;

    let policy = config.keep_or(cli.keep);
    let plan = resolve(&index, policy);
    log::info!(
        "{} duplicate set(s), {} file(s) to quarantine, keep policy {}",
        plan.duplicate_groups,
        plan.quarantine.len(),
        policy
    );

    if cli.output == OutputFormat::Text {
        TextSummary::new(&plan).write_to(out)?;
        report_scan_failures(&report, out)?;
    }

    if cli.dry_run {
        let code = scan_exit_code(&report);
        if cli.output == OutputFormat::Json {
            JsonOutput::new(&plan, &report, true, code).write_to(out, true)?;
        }
        return Ok(code);
    }

    out.flush()?;
    let confirmed = confirmation.confirm(&plan)?;
    if shutdown.is_shutdown_requested() {
        log::warn!("Interrupted at the confirmation prompt, nothing moved");
        return Err(Interrupted.into());
    }
    if !confirmed {
        log::info!("Quarantine declined");
        let code = scan_exit_code(&report);
        match cli.output {
            OutputFormat::Text => writeln!(out, "No files were moved.")?,
            OutputFormat::Json => {
                JsonOutput::new(&plan, &report, false, code).write_to(out, true)?;
            }
        }
        return Ok(code);
    }

    let directory = quarantine_directory(cli, config)?;
    let moved = quarantine(&plan, &directory, &progress, shutdown)?;

    let code = if moved.interrupted {
        ExitCode::Interrupted
    } else if report.failures.is_empty() && moved.all_succeeded() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    };

    match cli.output {
        OutputFormat::Text => {
            writeln!(out, "{}", moved.summary())?;
            if !plan.is_empty() {
                writeln!(out, "Quarantine directory: {}", directory.display())?;
            }
            for (path, error) in &moved.failures {
                writeln!(out, "  not moved: {} ({})", path.display(), error)?;
            }
        }
        OutputFormat::Json => {
            JsonOutput::new(&plan, &report, false, code)
                .with_quarantine(&directory, &moved)
                .write_to(out, true)?;
        }
    }

    Ok(code)
}

fn quarantine(
    plan: &ReclaimPlan,
    directory: &Path,
    progress: &Progress,
    shutdown: &ShutdownHandler,
) -> Result<QuarantineReport> {
    if plan.is_empty() {
        log::info!("Nothing to quarantine");
        return Ok(QuarantineReport::default());
    }

    QuarantineExecutor::new(directory.to_path_buf())
        .with_shutdown_flag(shutdown.get_flag())
        .execute_plan(plan, Some(progress))
        .with_context(|| format!("quarantining into {}", directory.display()))
}

fn quarantine_directory(cli: &Cli, config: &Config) -> Result<PathBuf> {
    config
        .quarantine_dir_or(cli.quarantine_dir.clone())
        .or_else(default_quarantine_dir)
        .context("cannot determine a home directory for the quarantine folder")
}

fn scan_exit_code(report: &IndexReport) -> ExitCode {
    if report.failures.is_empty() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    }
}

fn report_scan_failures(report: &IndexReport, out: &mut dyn Write) -> io::Result<()> {
    if report.failures.is_empty() {
        return Ok(());
    }
    writeln!(
        out,
        "{} file(s) or folder(s) could not be read and were skipped (run with -v for details)",
        report.failures.len()
    )
}
