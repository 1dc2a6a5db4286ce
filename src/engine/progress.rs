//! Progress bar over resolved tasks. Only the supervisor thread touches it.

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " files"
    )))
}

/// Bar for a run of `total` tasks, or None when progress is off.
pub fn setup_progress(enabled: bool, total: usize) -> Option<ProgressBar> {
    enabled.then(|| create_progress_bar(ProgressBarConfig::new(total, "Grabbing", Animation::Classic)))
}

/// Advance the bar by `n`. Uses try_lock so a contended bar never blocks the caller.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Print a trailing newline so log lines after the bar start on a fresh line.
pub fn finish_progress_bar(pb: &ProgressBar) {
    if let Ok(mut pb) = pb.lock() {
        let _ = pb.refresh();
        eprintln!();
    }
}
