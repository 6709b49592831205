//! Progress reporting utilities using indicatif.
//!
//! The scan session reports through the [`ProgressCallback`] trait; the
//! binary plugs in [`Progress`], which draws one bar per phase.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Phase name used while classifying files.
pub const PHASE_CLASSIFY: &str = "classify";

/// Progress callback for scan phases.
///
/// Implement this trait to receive progress updates during a scan.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (e.g., "classify")
    /// * `total` - Total number of items to process
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed, providing its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupsweep::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref pb) = *guard {
                f(pb);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        pb.set_style(Self::bar_style());
        pb.set_message(phase_label(phase));
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(previous) = guard.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let display_msg = truncate_path(path, 30);
        self.with_bar(|pb| {
            pb.set_position(current as u64);
            pb.set_message(display_msg);
        });
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_with_message(format!("{} complete", phase_label(phase)));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }

        let message = message.to_string();
        self.with_bar(|pb| pb.set_message(message));
    }
}

fn phase_label(phase: &str) -> String {
    match phase {
        PHASE_CLASSIFY => "Classifying".to_string(),
        other => other.to_string(),
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len + 3 - max_len.min(name_len + 3))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
