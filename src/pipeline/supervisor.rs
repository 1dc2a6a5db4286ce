//! Supervisor: seeds the queue, starts the pool, folds feedback into a termination decision.
//!
//! All pool bookkeeping lives in [`AggregationState`], owned by the supervisor loop and
//! touched nowhere else. Workers only talk to it through the feedback and event channels.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, bounded, never, select, unbounded};
use log::{debug, info, warn};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::events::{WorkerEvent, record_event};
use super::queue::{QueueCloser, task_queue};
use super::worker::{WorkerContext, spawn_worker};
use crate::engine::progress::{ProgressBar, update_progress_bar};
use crate::engine::transfer::Fetcher;
use crate::{Feedback, PoolOpts, RunReport, Task};

/// What the supervisor loop must do after applying one feedback signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Continue,
    /// Start one replacement worker.
    SpawnReplacement,
    /// Every task is resolved: close the queue and return.
    Terminate,
    /// Tasks are pending but no worker is alive and the respawn budget is spent.
    Exhausted,
}

/// Counters behind the termination decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationState {
    pub total: usize,
    pub succeeded: usize,
    pub unavailable: usize,
    pub already_present: usize,
    pub live_workers: usize,
    pub respawns: usize,
    pub max_respawns: usize,
}

impl AggregationState {
    pub fn new(total: usize, initial_workers: usize, max_respawns: usize) -> Self {
        Self {
            total,
            succeeded: 0,
            unavailable: 0,
            already_present: 0,
            live_workers: initial_workers,
            respawns: 0,
            max_respawns,
        }
    }

    /// Tasks without a terminal outcome yet.
    pub fn pending(&self) -> usize {
        self.total
            .saturating_sub(self.succeeded + self.unavailable + self.already_present)
    }

    pub fn apply(&mut self, feedback: Feedback) -> Decision {
        match feedback {
            Feedback::Success => self.succeeded += 1,
            Feedback::Unavailable => self.unavailable += 1,
            Feedback::AlreadyExists => self.already_present += 1,
            Feedback::Respawn => {
                self.live_workers = self.live_workers.saturating_sub(1);
                if self.pending() == 0 {
                    return Decision::Terminate;
                }
                if self.respawns < self.max_respawns {
                    self.respawns += 1;
                    self.live_workers += 1;
                    return Decision::SpawnReplacement;
                }
                return if self.live_workers == 0 {
                    Decision::Exhausted
                } else {
                    Decision::Continue
                };
            }
        }
        if self.pending() == 0 {
            Decision::Terminate
        } else {
            Decision::Continue
        }
    }

    /// Undo the optimistic `live_workers` bump when a replacement thread failed to start.
    pub fn spawn_failed(&mut self) -> Decision {
        self.live_workers = self.live_workers.saturating_sub(1);
        if self.live_workers == 0 && self.pending() > 0 {
            Decision::Exhausted
        } else {
            Decision::Continue
        }
    }

    fn fill_report(&self, report: &mut RunReport) {
        report.total = self.total;
        report.downloaded = self.succeeded;
        report.unavailable = self.unavailable;
        report.already_present = self.already_present;
        report.respawns = self.respawns;
    }
}

/// Channels and handles behind one pool run.
struct Pool {
    ctx: WorkerContext,
    closer: Option<QueueCloser>,
    feedback_rx: Receiver<Feedback>,
    event_rx: Receiver<WorkerEvent>,
    handles: Vec<JoinHandle<()>>,
    next_id: usize,
}

impl Pool {
    fn spawn(&mut self) -> Result<()> {
        let id = self.next_id;
        let handle = spawn_worker(id, &self.ctx).with_context(|| format!("spawn worker {id}"))?;
        self.next_id += 1;
        self.handles.push(handle);
        Ok(())
    }

    fn close_queue(&mut self) {
        if let Some(closer) = self.closer.take() {
            closer.close();
        }
    }

    fn join_workers(&mut self) {
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
    }

    fn drain_events(&self, report: &mut RunReport) {
        for event in self.event_rx.try_iter() {
            record_event(&event, report);
        }
    }
}

/// Run `tasks` through a pool of `workers` threads until every task is resolved, the pool is
/// exhausted (error), or `interrupt` fires (cancelled report). Blocks the calling thread.
pub fn run_pool(
    tasks: Vec<Task>,
    fetcher: Arc<dyn Fetcher>,
    opts: &PoolOpts,
    workers: usize,
    mut interrupt: Receiver<()>,
    progress: Option<ProgressBar>,
) -> Result<RunReport> {
    let total = tasks.len();
    let mut report = RunReport::default();
    if total == 0 {
        return Ok(report);
    }
    let workers = workers.max(1);

    let (queue, closer) = task_queue(total);
    let (feedback_tx, feedback_rx) = bounded::<Feedback>(total);
    let (event_tx, event_rx) = unbounded::<WorkerEvent>();

    for task in tasks {
        queue
            .push(task)
            .map_err(|e| anyhow::anyhow!("seeding queue: {}", e))?;
    }

    let mut pool = Pool {
        ctx: WorkerContext {
            queue,
            feedback_tx,
            event_tx,
            fetcher,
            opts: Arc::new(opts.clone()),
        },
        closer: Some(closer),
        feedback_rx,
        event_rx,
        handles: Vec::with_capacity(workers),
        next_id: 0,
    };
    for _ in 0..workers {
        pool.spawn()?;
    }
    info!("{} workers spawned for {} tasks", workers, total);

    let mut state = AggregationState::new(total, workers, opts.max_respawns);
    let feedback_rx = pool.feedback_rx.clone();
    let event_rx = pool.event_rx.clone();
    loop {
        select! {
            recv(feedback_rx) -> msg => {
                // The pool context keeps a sender alive, so this never disconnects.
                let Ok(feedback) = msg else { continue };
                if feedback.is_terminal()
                    && let Some(bar) = &progress
                {
                    update_progress_bar(bar, 1);
                }
                let mut decision = state.apply(feedback);
                if decision == Decision::SpawnReplacement {
                    debug!("respawning worker ({} of {} allowed)", state.respawns, state.max_respawns);
                    decision = match pool.spawn() {
                        Ok(()) => Decision::Continue,
                        Err(e) => {
                            warn!("{:#}", e);
                            state.spawn_failed()
                        }
                    };
                } else if feedback == Feedback::Respawn && decision == Decision::Continue {
                    warn!(
                        "respawn limit ({}) reached, continuing with {} workers",
                        state.max_respawns, state.live_workers
                    );
                }
                match decision {
                    Decision::Continue | Decision::SpawnReplacement => {}
                    Decision::Terminate => {
                        info!("All downloads ended!");
                        pool.close_queue();
                        pool.join_workers();
                        break;
                    }
                    Decision::Exhausted => {
                        pool.close_queue();
                        pool.drain_events(&mut report);
                        anyhow::bail!(
                            "worker pool exhausted: {} respawns used, {} tasks still pending",
                            state.respawns,
                            state.pending()
                        );
                    }
                }
            }
            recv(event_rx) -> msg => {
                if let Ok(event) = msg {
                    record_event(&event, &mut report);
                }
            }
            recv(interrupt) -> msg => {
                if msg.is_err() {
                    // Interrupt source went away; stop listening to it.
                    interrupt = never();
                    continue;
                }
                warn!("interrupted, {} tasks abandoned", state.pending());
                pool.close_queue();
                report.cancelled = true;
                break;
            }
        }
    }

    pool.drain_events(&mut report);
    state.fill_report(&mut report);
    report.workers_spawned = pool.next_id;
    Ok(report)
}
