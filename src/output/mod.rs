//! Output formatters for reclaim plans.
//!
//! - Text summary for the interactive flow ([`TextSummary`])
//! - JSON for automation and scripting ([`json`])
//!
//! # Example
//!
//! ```
//! use deduplicate_files::duplicates::ReclaimPlan;
//! use deduplicate_files::output::TextSummary;
//!
//! let plan = ReclaimPlan::default();
//! let mut out = Vec::new();
//! TextSummary::new(&plan).write_to(&mut out).unwrap();
//! assert!(String::from_utf8(out).unwrap().contains("0 duplicate set(s)"));
//! ```

pub mod json;

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::duplicates::ReclaimPlan;

pub use json::{JsonOutput, JsonOutputError};

/// Human-readable plan summary printed before the confirmation prompt.
#[derive(Debug, Clone, Copy)]
pub struct TextSummary<'a> {
    plan: &'a ReclaimPlan,
}

impl<'a> TextSummary<'a> {
    #[must_use]
    pub fn new(plan: &'a ReclaimPlan) -> Self {
        Self { plan }
    }

    /// The headline: approximate megabytes, exact size and set count.
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "Approximate space to be saved: {:.2} MB ({}) in {} duplicate set(s)",
            self.plan.reclaimable_megabytes(),
            ByteSize::b(self.plan.reclaimable_bytes),
            self.plan.duplicate_groups
        )
    }

    /// Write the summary and the full quarantine list.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{}", self.headline())?;

        if self.plan.is_empty() {
            writeln!(writer, "No duplicate files found.")?;
            return Ok(());
        }

        writeln!(writer, "Files to be moved:")?;
        for path in &self.plan.quarantine {
            writeln!(writer, "  {}", path.display())?;
        }
        Ok(())
    }
}
