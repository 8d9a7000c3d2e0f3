//! File actions module.
//!
//! This module provides functionality for:
//! - Asking the user before anything is touched ([`confirm`])
//! - Moving duplicates into a quarantine directory ([`quarantine`])
//!
//! ```no_run
//! use deduplicate_files::actions::{AutoConfirm, Confirmation, NoProgress, QuarantineExecutor};
//! use deduplicate_files::duplicates::ReclaimPlan;
//! use std::path::PathBuf;
//!
//! let plan = ReclaimPlan::default();
//! if AutoConfirm(true).confirm(&plan).unwrap() {
//!     let executor = QuarantineExecutor::new(PathBuf::from("/tmp/quarantine"));
//!     let report = executor.execute_plan::<NoProgress>(&plan, None).unwrap();
//!     println!("{}", report.summary());
//! }
//! ```

pub mod confirm;
pub mod quarantine;

pub use confirm::{is_affirmative, AutoConfirm, Confirmation, PromptConfirmation, PROMPT};
pub use quarantine::{
    default_quarantine_dir, validate_preserves_copy, NoProgress, QuarantineError,
    QuarantineExecutor, QuarantineManifest, QuarantineProgressCallback, QuarantineReport,
    QuarantinedFile, QUARANTINE_DIR_NAME,
};
