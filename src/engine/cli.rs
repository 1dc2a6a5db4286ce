//! CLI command handler: merge config sources, install Ctrl+C, run the grab.

use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use log::{debug, warn};
use std::time::Duration;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::pipeline::grab;
use crate::utils::feedgrab_toml::{apply_file_to_opts, load_feedgrab_toml};
use crate::utils::{feed_from_env, setup_logging};

/// Defaults → `.feedgrab.toml` → `FEEDGRAB_FEED` / `.env` (feed only) → CLI flags.
/// Broken config sources are skipped and returned, so they can be logged once logging is up.
pub fn build_opts(cli: &Cli) -> (Opts, Vec<anyhow::Error>) {
    let mut opts = Opts::default();
    opts.pool.output_dir = cli.dir.clone();
    let mut skipped = Vec::new();

    match load_feedgrab_toml(&opts.config_path()) {
        Ok(Some(file)) => apply_file_to_opts(&file, &mut opts),
        Ok(None) => {}
        Err(e) => skipped.push(e),
    }
    match feed_from_env(&cli.dir) {
        Ok(Some(feed)) => opts.feed = feed,
        Ok(None) => {}
        Err(e) => skipped.push(e),
    }
    apply_cli_to_opts(cli, &mut opts);
    (opts, skipped)
}

fn apply_cli_to_opts(cli: &Cli, opts: &mut Opts) {
    if let Some(feed) = &cli.feed {
        opts.feed = feed.clone();
    }
    if let Some(n) = cli.workers {
        opts.pool.num_threads = Some(n);
    }
    if let Some(d) = cli.max_day {
        opts.max_day = d;
    }
    if let Some(r) = cli.retries {
        opts.pool.retry_ceiling = r;
    }
    if let Some(secs) = cli.backoff {
        opts.pool.retry_backoff = Duration::from_secs(secs);
    }
    if let Some(n) = cli.max_respawns {
        opts.pool.max_respawns = n;
    }
    if let Some(tag) = &cli.media_tag {
        opts.media.tag = tag.clone();
    }
    if let Some(attr) = &cli.src_attr {
        opts.media.src_attr = attr.clone();
    }
    if let Some(n) = cli.attrs {
        opts.media.expected_attrs = (n > 0).then_some(n);
    }
    if let Some(ext) = &cli.ext {
        opts.pool.extension = ext.trim_start_matches('.').to_string();
    }
    if let Some(secs) = cli.connect_timeout {
        opts.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(p) = cli.progress {
        opts.progress = p;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    opts.quiet = cli.quiet;
    opts.dry_run = cli.dry_run;
}

/// Run one grab. Exits non-zero (via Err) on startup failure, pool exhaustion or Ctrl+C.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let (opts, skipped) = build_opts(cli);
    setup_logging(opts.verbose, opts.quiet);
    for e in &skipped {
        warn!("ignoring config: {:#}", e);
    }
    debug!("{} CONFIG:{:#?}", env!("CARGO_PKG_NAME").to_uppercase(), opts);

    if opts.dry_run {
        warn!("RUNNING IN DRY-RUN MODE. NOTHING WILL BE DOWNLOADED.");
    }

    let (interrupt_tx, interrupt_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    })
    .context("set Ctrl+C handler")?;

    let report = grab(&opts, interrupt_rx)?;
    if report.cancelled {
        return Err(anyhow::anyhow!(
            "Download cancelled by user; {} of {} tasks resolved",
            report.resolved(),
            report.total
        ));
    }
    Ok(())
}
