//! Terminal progress using indicatif.
//!
//! [`Progress`] draws a spinner while the index is built and a bar while
//! files are quarantined. Everything goes to stderr so JSON on stdout stays
//! clean. In quiet mode nothing is drawn.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::actions::quarantine::{QuarantineProgressCallback, QuarantineReport};

/// Progress events from the index build.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts; `total` is 0 when unknown.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each file processed (`current` is 1-based).
    fn on_progress(&self, current: usize, path: &str);

    /// Called with the size of each file hashed.
    fn on_item_completed(&self, _bytes: u64) {}

    fn on_phase_end(&self, phase: &str);
}

/// indicatif-backed reporter for both the scan and the quarantine step.
pub struct Progress {
    scan: Mutex<Option<ProgressBar>>,
    moves: Mutex<Option<ProgressBar>>,
    bytes_hashed: AtomicU64,
    quiet: bool,
}

impl Progress {
    /// Create a reporter; `quiet` disables all drawing.
    ///
    /// ```
    /// use deduplicate_files::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// assert!(progress.is_quiet());
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            scan: Mutex::new(None),
            moves: Mutex::new(None),
            bytes_hashed: AtomicU64::new(0),
            quiet,
        }
    }

    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Total bytes reported through `on_item_completed`.
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed.load(Ordering::Relaxed)
    }

    fn new_bar(&self, len: Option<u64>) -> ProgressBar {
        let pb = match len {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        if self.quiet {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        } else {
            pb.set_draw_target(ProgressDrawTarget::stderr());
        }
        pb
    }

    fn scan_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn move_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_scan(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(ref pb) = *self.scan.lock().unwrap_or_else(PoisonError::into_inner) {
            f(pb);
        }
    }

    fn with_moves(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(ref pb) = *self.moves.lock().unwrap_or_else(PoisonError::into_inner) {
            f(pb);
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        let pb = self.new_bar(None);
        pb.set_style(Self::scan_style());
        pb.set_message(format!("Fingerprinting ({phase})"));
        if !self.quiet {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        *self.scan.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        self.with_scan(|pb| {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(path, 40));
        });
    }

    fn on_item_completed(&self, bytes: u64) {
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_phase_end(&self, _phase: &str) {
        let taken = self
            .scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pb) = taken {
            pb.finish_with_message(format!(
                "Fingerprinted {}",
                ByteSize::b(self.bytes_hashed())
            ));
        }
    }
}

impl QuarantineProgressCallback for Progress {
    fn on_before_move(&self, path: &Path, index: usize, total: usize) {
        let mut moves = self.moves.lock().unwrap_or_else(PoisonError::into_inner);
        let pb = moves.get_or_insert_with(|| {
            let pb = self.new_bar(Some(total as u64));
            pb.set_style(Self::move_style());
            pb
        });
        pb.set_position(index as u64);
        pb.set_message(truncate_path(&path.to_string_lossy(), 40));
    }

    fn on_move_success(&self, _path: &Path, _size: u64) {
        self.with_moves(|pb| pb.inc(1));
    }

    fn on_move_failure(&self, _path: &Path, _error: &str) {
        self.with_moves(|pb| pb.inc(1));
    }

    fn on_complete(&self, report: &QuarantineReport) {
        let taken = self
            .moves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pb) = taken {
            pb.finish_with_message(report.summary());
        }
    }
}

/// Shorten a path to at most `max_len` characters, keeping the file name.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name_len = file_name.chars().count();

    if name_len + 4 > max_len {
        let keep = max_len.saturating_sub(3);
        let tail: String = file_name.chars().skip(name_len.saturating_sub(keep)).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
