//! Application configuration constants.
//! Defaults and tuning in one place.

use std::sync::OnceLock;

// ---- Package / names (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    feed_env_var: String,
    user_agent: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                feed_env_var: format!("{}_FEED", pkg.to_uppercase()),
                user_agent: format!("{pkg}/{}", env!("CARGO_PKG_VERSION")),
            }
        })
    }

    /// Per-directory config file (`.feedgrab.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Environment variable holding the feed source (`FEEDGRAB_FEED`).
    pub fn feed_env_var(&self) -> &str {
        &self.feed_env_var
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

// ---- Defaults ----

/// Default values for every tunable in [`Opts`](crate::Opts).
pub struct Defaults;

impl Defaults {
    pub const FEED_URL: &'static str = "http://www.radio-t.com/podcast-archives.rss";
    /// Items published on day-of-month 1..=MAX_DAY are eligible.
    pub const MAX_DAY: u32 = 7;
    pub const MEDIA_TAG: &'static str = "audio";
    pub const SRC_ATTR: &'static str = "src";
    /// `<audio src=".." preload="none">` as published by the default feed.
    pub const EXPECTED_ATTRS: Option<usize> = Some(2);
    pub const EXTENSION: &'static str = "mp3";
    /// Tasks with more attempts than this are abandoned.
    pub const RETRY_CEILING: u32 = 10;
    /// Upper bound accepted for the retry ceiling from the CLI or the config file.
    pub const MAX_RETRY_CEILING: u32 = 1000;
    pub const RETRY_BACKOFF_SECS: u64 = 4;
    pub const MAX_RESPAWNS: usize = 32;
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;
    pub const MAX_REDIRECTS: usize = 10;
}

// ---- Worker threads ----

/// Thread limits for sizing the initial worker pool.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Never run fewer workers than this.
    pub floor: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 1;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }
}

// ---- Partial downloads ----

/// Suffix of the hidden files a download streams into. Only files ending in it are swept.
pub const PARTIAL_SUFFIX: &str = "feedgrab-part";
