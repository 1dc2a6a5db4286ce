use clap::Parser;
use std::path::PathBuf;

use crate::utils::config::Defaults;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Grab the recent episodes of an RSS feed with a pool of download workers.
#[derive(Clone, Parser)]
#[command(name = "feedgrab")]
#[command(about = "Download the media of recent RSS items; re-runs skip files already present.")]
pub struct Cli {
    /// Output directory (also where .feedgrab.toml and .env are looked up). Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Feed URL or local file. Default: $FEEDGRAB_FEED, then the config file, then the built-in feed.
    #[arg(long, short = 'u', value_name = "FEED")]
    pub feed: Option<String>,

    /// Initial worker threads. Default: available parallelism (capped by the open-file limit).
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Only items published on day-of-month 1..=N are downloaded.
    #[arg(long, value_name = "N")]
    pub max_day: Option<u32>,

    /// Give up on a task after this many failed attempts (at most 1000).
    #[arg(long, short = 'r', value_parser = clap::value_parser!(u32).range(0..=Defaults::MAX_RETRY_CEILING as i64))]
    pub retries: Option<u32>,

    /// Seconds to wait before retrying a failed transfer.
    #[arg(long, short = 'b', value_name = "SECS")]
    pub backoff: Option<u64>,

    /// Replacement workers allowed over the whole run after worker faults.
    #[arg(long)]
    pub max_respawns: Option<usize>,

    /// Element holding the media URL inside each item's content.
    #[arg(long, value_name = "TAG")]
    pub media_tag: Option<String>,

    /// Attribute of the media element holding the URL.
    #[arg(long, value_name = "ATTR")]
    pub src_attr: Option<String>,

    /// Exact attribute count the media element must have; 0 accepts any.
    #[arg(long, value_name = "N")]
    pub attrs: Option<usize>,

    /// Output file extension.
    #[arg(long)]
    pub ext: Option<String>,

    /// TCP connect timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Fetch and filter the feed, list what would be downloaded, download nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Show a progress bar.
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Only warnings and errors.
    #[arg(long, short = 'q')]
    pub quiet: bool,
}
