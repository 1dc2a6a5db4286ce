//! Load `.feedgrab.toml` from the output directory (CLI only). Lib callers build [`Opts`] directly.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::Opts;
use crate::utils::config::Defaults;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FeedgrabToml {
    #[serde(default)]
    settings: GrabSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct GrabSection {
    feed: Option<String>,
    workers: Option<usize>,
    max_day: Option<u32>,
    media_tag: Option<String>,
    src_attr: Option<String>,
    /// Expected attribute count on the media element; 0 disables the check.
    attrs: Option<usize>,
    extension: Option<String>,
    retries: Option<u32>,
    backoff_secs: Option<u64>,
    max_respawns: Option<usize>,
    connect_timeout_secs: Option<u64>,
    progress: Option<bool>,
    verbose: Option<bool>,
}

/// Load `.feedgrab.toml` from `path`. `Ok(None)` when there is no file; unreadable or invalid
/// files are errors the caller may downgrade to a warning. CLI only.
pub(crate) fn load_feedgrab_toml(path: &Path) -> anyhow::Result<Option<FeedgrabToml>> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    let file = parse_feedgrab_toml(&s).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(file))
}

pub(crate) fn parse_feedgrab_toml(s: &str) -> Result<FeedgrabToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $target:expr, $sec_field:ident => $target_field:ident) => {
        if let Some(v) = $sec.$sec_field.clone() {
            $target.$target_field = v;
        }
    };
}

/// Apply file config to opts (only set fields present in the file). Call before applying CLI.
/// `dry_run` and the output directory are never taken from the file.
pub(crate) fn apply_file_to_opts(file: &FeedgrabToml, opts: &mut Opts) {
    let sec = &file.settings;
    apply_file_opt!(sec, opts, feed => feed);
    apply_file_opt!(sec, opts, max_day => max_day);
    apply_file_opt!(sec, opts.media, media_tag => tag);
    apply_file_opt!(sec, opts.media, src_attr => src_attr);
    if let Some(n) = sec.attrs {
        opts.media.expected_attrs = (n > 0).then_some(n);
    }
    apply_file_opt!(sec, opts.pool, extension => extension);
    if let Some(r) = sec.retries {
        opts.pool.retry_ceiling = r.min(Defaults::MAX_RETRY_CEILING);
    }
    apply_file_opt!(sec, opts.pool, max_respawns => max_respawns);
    if let Some(n) = sec.workers {
        opts.pool.num_threads = Some(n);
    }
    if let Some(secs) = sec.backoff_secs {
        opts.pool.retry_backoff = Duration::from_secs(secs);
    }
    if let Some(secs) = sec.connect_timeout_secs {
        opts.connect_timeout = Duration::from_secs(secs);
    }
    apply_file_opt!(sec, opts, progress => progress);
    apply_file_opt!(sec, opts, verbose => verbose);
}
