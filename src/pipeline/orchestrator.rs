use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::engine::progress::{finish_progress_bar, setup_progress};
use crate::engine::tools::determine_worker_count;
use crate::engine::transfer::{HttpConfig, HttpFetcher, build_client};
use crate::feed::{load_feed, select_downloads, tasks_from_selection};
use crate::pipeline::supervisor::run_pool;
use crate::utils::config::{PackagePaths, WorkerThreadLimits};
use crate::utils::sweep_stale_partials;
use crate::{Opts, RunReport, Task};

/// Fetch the feed and turn its eligible items into fresh tasks.
/// Fails when the feed is unreachable or unparsable, or when no item survives filtering.
pub fn collect_tasks(opts: &Opts, client: &reqwest::blocking::Client) -> Result<Vec<Task>> {
    let items = load_feed(&opts.feed, client)?;
    debug!("{} items in feed", items.len());
    let selected = select_downloads(&items, opts.max_day, &opts.media);
    if selected.is_empty() {
        anyhow::bail!(
            "Feed unavailable: no item of {} published on day 1..={} has a <{}> URL",
            opts.feed,
            opts.max_day,
            opts.media.tag
        );
    }
    Ok(tasks_from_selection(selected))
}

/// Full run: feed → tasks → worker pool. `interrupt` cancels the pool when it receives a message.
pub fn grab(opts: &Opts, interrupt: Receiver<()>) -> Result<RunReport> {
    let client = build_client(&HttpConfig {
        connect_timeout: opts.connect_timeout,
        user_agent: PackagePaths::get().user_agent().to_string(),
    })
    .context("build HTTP client")?;

    let tasks = collect_tasks(opts, &client)?;
    let total = tasks.len();

    if opts.dry_run {
        for task in &tasks {
            info!("would download {:?} from {}", task.name, task.url);
        }
        return Ok(RunReport {
            total,
            ..RunReport::default()
        });
    }

    let output_dir = &opts.pool.output_dir;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;
    let swept = sweep_stale_partials(output_dir)?;
    if swept > 0 {
        debug!("removed {} stale partial downloads", swept);
    }

    let workers = determine_worker_count(opts.pool.num_threads, WorkerThreadLimits::current());
    let bar = setup_progress(opts.progress, total);
    let report = run_pool(
        tasks,
        Arc::new(HttpFetcher::new(client)),
        &opts.pool,
        workers,
        interrupt,
        bar.clone(),
    );
    if let Some(bar) = &bar {
        finish_progress_bar(bar);
    }
    let report = report?;
    log_summary(&report);
    Ok(report)
}

/// One-line outcome of a run.
pub fn log_summary(report: &RunReport) {
    let line = format!(
        "{} downloaded, {} already present, {} unavailable of {} ({} respawns, {} retries)",
        report.downloaded,
        report.already_present,
        report.unavailable,
        report.total,
        report.respawns,
        report.backoffs
    );
    if report.unavailable > 0 || report.cancelled {
        warn!("{}", line);
    } else {
        info!("{}", line);
    }
}
