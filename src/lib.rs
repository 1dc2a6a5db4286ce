//! Feedgrab: download the media of recent RSS items with a self-healing worker pool

pub mod engine;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::transfer::{Fetcher, HttpConfig, HttpFetcher};
pub use error::{ExtractError, TransferError, WorkerFault};
pub use feed::MediaShape;
pub use pipeline::{collect_tasks, grab, run_pool};

use log::debug;

/// Result alias used by public feedgrab API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point for library use: run the whole grab with `opts`, no interrupt source.
///
/// The CLI goes through [`engine::handle_run`], which also wires Ctrl+C. Use
/// [`grab`] directly when you need to cancel a run from another thread.
///
/// ```ignore
/// let opts = feedgrab::Opts { max_day: 3, ..Default::default() };
/// let report = feedgrab::grab_feed(&opts)?;
/// println!("{} new files", report.downloaded);
/// ```
pub fn grab_feed(opts: &Opts) -> Result<RunReport> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    pipeline::grab(opts, crossbeam_channel::never())
}
