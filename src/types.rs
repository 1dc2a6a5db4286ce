//! Public and internal types for the feedgrab API and worker pool.

use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use std::time::Duration;

use crate::feed::MediaShape;
use crate::utils::config::{Defaults, PackagePaths};

/// One media file to fetch. `name` is the output stem (item title), `attempt` counts failed transfers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub url: String,
    pub attempt: u32,
}

impl Task {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            attempt: 0,
        }
    }
}

/// Signal sent from a worker to the supervisor. Each task produces exactly one of
/// `Success`, `Unavailable` or `AlreadyExists`; `Respawn` is pool management only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// A worker died and a replacement should be started.
    Respawn,
    /// One task was fully downloaded.
    Success,
    /// One task failed permanently or was lost with a dead worker.
    Unavailable,
    /// One task's output was already on disk.
    AlreadyExists,
}

impl Feedback {
    /// True for the three per-task outcomes.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Feedback::Respawn)
    }
}

/// One `<item>` of the feed, reduced to the fields the filter needs.
#[derive(Clone, Debug, Default)]
pub struct FeedItem {
    pub title: Option<String>,
    pub pub_date: Option<DateTime<FixedOffset>>,
    /// `content:encoded`, or the description when the item has no encoded content.
    pub content: Option<String>,
}

/// Counters returned by the supervisor once the run is over.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub total: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub unavailable: usize,
    /// Replacement workers started after a fault.
    pub respawns: usize,
    /// Every worker thread started, initial pool included.
    pub workers_spawned: usize,
    /// Backoff pauses taken before retried transfers.
    pub backoffs: usize,
    /// Failed transfer attempts, retried or not.
    pub transfer_failures: usize,
    /// True when the run was stopped by an interrupt before every task resolved.
    pub cancelled: bool,
}

impl RunReport {
    /// Tasks that reached a terminal outcome.
    pub fn resolved(&self) -> usize {
        self.downloaded + self.already_present + self.unavailable
    }
}

/// Settings the worker pool needs; everything else in [`Opts`] is feed selection or CLI.
#[derive(Clone, Debug)]
pub struct PoolOpts {
    /// Directory the outputs are written to.
    pub output_dir: PathBuf,
    /// Output extension without the dot.
    pub extension: String,
    /// Initial number of worker threads. When None, derived from available parallelism and FD limit.
    pub num_threads: Option<usize>,
    /// Attempts above this are abandoned as `Unavailable`.
    pub retry_ceiling: u32,
    /// Fixed pause before any retried transfer.
    pub retry_backoff: Duration,
    /// Replacement workers the supervisor may start over the whole run.
    pub max_respawns: usize,
}

impl Default for PoolOpts {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            extension: Defaults::EXTENSION.to_string(),
            num_threads: None,
            retry_ceiling: Defaults::RETRY_CEILING,
            retry_backoff: Duration::from_secs(Defaults::RETRY_BACKOFF_SECS),
            max_respawns: Defaults::MAX_RESPAWNS,
        }
    }
}

/// Full options (CLI, config file and lib).
#[derive(Clone, Debug)]
pub struct Opts {
    /// Feed URL (`http://` / `https://`) or local file path.
    pub feed: String,
    /// Items whose publication day-of-month is above this are skipped.
    pub max_day: u32,
    /// How the media element is located inside an item's content.
    pub media: MediaShape,
    pub pool: PoolOpts,
    /// TCP connect timeout for feed and media requests.
    pub connect_timeout: Duration,
    /// Fetch and filter only; log what would be downloaded.
    pub dry_run: bool,
    /// Show a progress bar over resolved tasks.
    pub progress: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            feed: Defaults::FEED_URL.to_string(),
            max_day: Defaults::MAX_DAY,
            media: MediaShape::default(),
            pool: PoolOpts::default(),
            connect_timeout: Duration::from_secs(Defaults::CONNECT_TIMEOUT_SECS),
            dry_run: false,
            progress: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl Opts {
    /// Path of the optional per-directory config file.
    pub fn config_path(&self) -> PathBuf {
        self.pool
            .output_dir
            .join(PackagePaths::get().config_filename())
    }
}
