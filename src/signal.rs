//! Ctrl+C handling.
//!
//! A single process-wide [`ShutdownHandler`] wraps the `AtomicBool` that the
//! traverser, fingerprinter and quarantine executor poll. The first Ctrl+C
//! sets it. During the scan the run stops before the quarantine step; at the
//! confirmation prompt the answer is ignored; during the moves the batch ends
//! after the current file. Each case exits with code 130. A second Ctrl+C
//! exits immediately.
//!
//! ```rust,no_run
//! use deduplicate_files::signal::install_handler;
//!
//! let handler = install_handler();
//! let flag = handler.get_flag();
//! // pass `flag` to IndexConfig::with_shutdown_flag
//! # drop(flag);
//! ```

use std::io::Write;

use crate::error::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag for worker code.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the Ctrl+C hook once per process and return its handler.
///
/// Later calls return the same handler with the flag cleared, so repeated
/// runs in one process (tests) each start fresh. If the hook cannot be
/// registered the returned handler still works for manual requests.
pub fn install_handler() -> ShutdownHandler {
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();

        let installed = ctrlc::set_handler(move || {
            let mut stderr = std::io::stderr();
            if flag.swap(true, Ordering::SeqCst) {
                let _ = writeln!(stderr, "\nInterrupted again, exiting now.");
                std::process::exit(ExitCode::Interrupted.as_i32());
            }
            let _ = writeln!(
                stderr,
                "\nInterrupted. Stopping after the current step, Ctrl+C again to exit now."
            );
            let _ = stderr.flush();
            log::info!("Shutdown signal received");
        });
        if let Err(e) = installed {
            log::debug!("Ctrl+C handler not installed ({}), using unhooked handler", e);
        }
        handler
    });

    handler.reset();
    handler.clone()
}
