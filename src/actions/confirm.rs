//! Confirmation boundary between planning and quarantine.
//!
//! Nothing is moved unless a [`Confirmation`] answers yes. The interactive
//! implementation reads one line and accepts only `y` or `Y` followed by the
//! line terminator; anything else, including end of input, declines.

use std::io::{self, BufRead, Write};

use crate::duplicates::ReclaimPlan;
use crate::output::TextSummary;

/// Prompt shown before any file is moved.
pub const PROMPT: &str = "Enter 'Y' to remove duplicate files";

/// Decides whether a plan may be executed.
pub trait Confirmation {
    /// Ask for approval of `plan`.
    ///
    /// # Errors
    ///
    /// I/O errors from the underlying prompt.
    fn confirm(&mut self, plan: &ReclaimPlan) -> io::Result<bool>;
}

/// Returns `true` if `answer` is an affirmative reply.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    answer
        .trim_end_matches(['\r', '\n'])
        .eq_ignore_ascii_case("y")
}

/// Interactive prompt over any reader/writer pair.
#[derive(Debug)]
pub struct PromptConfirmation<R, W> {
    input: R,
    output: W,
    show_plan: bool,
}

impl<R: BufRead, W: Write> PromptConfirmation<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            show_plan: false,
        }
    }

    /// Print the plan summary before the prompt. Used when stdout carries
    /// JSON and the user would otherwise confirm a list they have not seen.
    #[must_use]
    pub fn with_plan_summary(mut self, show: bool) -> Self {
        self.show_plan = show;
        self
    }

    /// Consume the prompt, returning the writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl PromptConfirmation<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr and read from stdin.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirmation for PromptConfirmation<R, W> {
    fn confirm(&mut self, plan: &ReclaimPlan) -> io::Result<bool> {
        if self.show_plan {
            TextSummary::new(plan).write_to(&mut self.output)?;
        }
        write!(self.output, "{PROMPT}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            log::debug!("End of input at confirmation prompt, treating as no");
            return Ok(false);
        }
        Ok(is_affirmative(&line))
    }
}

/// Fixed answer, for `--yes` and `--dry-run`.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmation for AutoConfirm {
    fn confirm(&mut self, _plan: &ReclaimPlan) -> io::Result<bool> {
        Ok(self.0)
    }
}
