//! Download worker: pop a task, skip / fetch / retry it, report one outcome per task.

use crossbeam_channel::Sender;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::events::WorkerEvent;
use super::queue::TaskQueue;
use crate::engine::tools::output_path_for;
use crate::engine::transfer::{Fetcher, download};
use crate::error::{QueueClosed, TransferError, WorkerFault};
use crate::{Feedback, PoolOpts, Task};

/// Everything a worker needs, cloned once per spawned worker.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: TaskQueue,
    pub feedback_tx: Sender<Feedback>,
    pub event_tx: Sender<WorkerEvent>,
    pub fetcher: Arc<dyn Fetcher>,
    pub opts: Arc<PoolOpts>,
}

impl WorkerContext {
    fn emit(&self, event: WorkerEvent) {
        let _ = self.event_tx.send(event);
    }

    fn output_path(&self, name: &str) -> PathBuf {
        output_path_for(&self.opts.output_dir, name, &self.opts.extension)
    }
}

/// Result of processing one task.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// The task reached a terminal outcome; send it as feedback.
    Resolved(Feedback),
    /// The transfer failed transiently; the task (attempt already bumped) goes back on the queue.
    Requeue(Task),
}

/// Decide and perform one task. Pure apart from the backoff sleep, the transfer and events.
pub fn process_task(worker: usize, mut task: Task, ctx: &WorkerContext) -> Step {
    let opts = &ctx.opts;
    if task.attempt > opts.retry_ceiling {
        ctx.emit(WorkerEvent::GaveUp {
            worker,
            name: task.name,
            attempts: task.attempt,
        });
        return Step::Resolved(Feedback::Unavailable);
    }
    if task.attempt > 0 {
        ctx.emit(WorkerEvent::BackingOff {
            worker,
            name: task.name.clone(),
            attempt: task.attempt,
        });
        thread::sleep(opts.retry_backoff);
    }

    let output = ctx.output_path(&task.name);
    if output_exists(&output) {
        ctx.emit(WorkerEvent::AlreadyPresent {
            worker,
            name: task.name,
        });
        return Step::Resolved(Feedback::AlreadyExists);
    }

    ctx.emit(WorkerEvent::Started {
        worker,
        name: task.name.clone(),
        attempt: task.attempt,
    });
    match download(ctx.fetcher.as_ref(), &task.url, &output) {
        Ok(bytes) => {
            ctx.emit(WorkerEvent::Downloaded {
                worker,
                name: task.name,
                bytes,
            });
            Step::Resolved(Feedback::Success)
        }
        Err(TransferError::Exists { .. }) => {
            ctx.emit(WorkerEvent::AlreadyPresent {
                worker,
                name: task.name,
            });
            Step::Resolved(Feedback::AlreadyExists)
        }
        Err(e) => {
            let will_retry = e.is_retryable();
            ctx.emit(WorkerEvent::TransferFailed {
                worker,
                name: task.name.clone(),
                attempt: task.attempt,
                error: e.to_string(),
                will_retry,
            });
            if will_retry {
                task.attempt = task.attempt.saturating_add(1);
                Step::Requeue(task)
            } else {
                Step::Resolved(Feedback::Unavailable)
            }
        }
    }
}

fn output_exists(output: &Path) -> bool {
    output.try_exists().unwrap_or(false)
}

/// Worker loop: runs until the queue closes or a fault kills the worker.
/// Each task is processed inside `catch_unwind`; a fault reports `Unavailable` for the lost
/// in-flight task, then `Respawn`, and ends the loop.
pub fn worker_loop(worker: usize, ctx: WorkerContext) {
    while let Some(task) = ctx.queue.pop() {
        let name = task.name.clone();
        let step = panic::catch_unwind(AssertUnwindSafe(|| process_task(worker, task, &ctx)));
        match step {
            Ok(Step::Resolved(feedback)) => {
                if ctx.feedback_tx.send(feedback).is_err() {
                    break;
                }
            }
            Ok(Step::Requeue(task)) => {
                if let Err(QueueClosed(task)) = ctx.queue.push(task) {
                    ctx.emit(WorkerEvent::Dropped {
                        worker,
                        name: task.name,
                    });
                    break;
                }
            }
            Err(payload) => {
                let fault = WorkerFault::from_panic(worker, &name, payload);
                ctx.emit(WorkerEvent::Died {
                    worker,
                    error: fault.to_string(),
                });
                let _ = ctx.feedback_tx.send(Feedback::Unavailable);
                let _ = ctx.feedback_tx.send(Feedback::Respawn);
                return;
            }
        }
    }
}

/// Start one worker thread named `feedgrab-w<id>`.
pub fn spawn_worker(worker: usize, ctx: &WorkerContext) -> std::io::Result<JoinHandle<()>> {
    let ctx = ctx.clone();
    thread::Builder::new()
        .name(format!("{}-w{worker}", env!("CARGO_PKG_NAME")))
        .spawn(move || worker_loop(worker, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue::task_queue;
    use crossbeam_channel::{Receiver, unbounded};
    use std::io::{Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Fetcher for CountingFetcher {
        fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, TransferError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TransferError::Connect {
                    url: url.to_string(),
                    message: "refused".into(),
                });
            }
            Ok(Box::new(Cursor::new(b"bytes".to_vec())))
        }
    }

    struct Harness {
        ctx: WorkerContext,
        fetcher: Arc<CountingFetcher>,
        feedback_rx: Receiver<Feedback>,
        events_rx: Receiver<WorkerEvent>,
        _dir: tempfile::TempDir,
    }

    fn harness(fail: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let (queue, closer) = task_queue(4);
        std::mem::forget(closer);
        let (feedback_tx, feedback_rx) = unbounded();
        let (event_tx, events_rx) = unbounded();
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail,
        });
        let opts = PoolOpts {
            output_dir: dir.path().to_path_buf(),
            retry_backoff: Duration::from_millis(1),
            ..PoolOpts::default()
        };
        Harness {
            ctx: WorkerContext {
                queue,
                feedback_tx,
                event_tx,
                fetcher: fetcher.clone(),
                opts: Arc::new(opts),
            },
            fetcher,
            feedback_rx,
            events_rx,
            _dir: dir,
        }
    }

    #[test]
    fn test_over_ceiling_is_unavailable_without_requeue() {
        let h = harness(false);
        let task = Task {
            attempt: 11,
            ..Task::new("old", "http://x/old")
        };
        assert_eq!(
            process_task(0, task, &h.ctx),
            Step::Resolved(Feedback::Unavailable)
        );
        assert!(h.ctx.queue.is_empty());
        assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_at_ceiling_still_tries() {
        let h = harness(false);
        let task = Task {
            attempt: 10,
            ..Task::new("last", "http://x/last")
        };
        assert_eq!(
            process_task(0, task, &h.ctx),
            Step::Resolved(Feedback::Success)
        );
    }

    #[test]
    fn test_existing_output_skips_network() {
        let h = harness(false);
        std::fs::write(h.ctx.output_path("have"), b"old").unwrap();
        assert_eq!(
            process_task(0, Task::new("have", "http://x/have"), &h.ctx),
            Step::Resolved(Feedback::AlreadyExists)
        );
        assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_connect_failure_bumps_attempt() {
        let h = harness(true);
        let step = process_task(0, Task::new("flaky", "http://x/flaky"), &h.ctx);
        assert_eq!(
            step,
            Step::Requeue(Task {
                attempt: 1,
                ..Task::new("flaky", "http://x/flaky")
            })
        );
    }

    #[test]
    fn test_attempt_counter_saturates() {
        let mut h = harness(true);
        h.ctx.opts = Arc::new(PoolOpts {
            retry_ceiling: u32::MAX,
            ..(*h.ctx.opts).clone()
        });
        let task = Task {
            attempt: u32::MAX,
            ..Task::new("stuck", "http://x/stuck")
        };
        match process_task(0, task, &h.ctx) {
            Step::Requeue(t) => assert_eq!(t.attempt, u32::MAX),
            other => panic!("expected requeue, got {other:?}"),
        }
    }

    #[test]
    fn test_retry_backs_off_first() {
        let h = harness(false);
        let task = Task {
            attempt: 2,
            ..Task::new("again", "http://x/again")
        };
        process_task(4, task, &h.ctx);
        let first = h.events_rx.try_recv().unwrap();
        assert!(matches!(first, WorkerEvent::BackingOff { worker: 4, attempt: 2, .. }));
    }

    #[test]
    fn test_loop_reports_and_exits_on_close() {
        let h = harness(false);
        let (queue, closer) = task_queue(2);
        let ctx = WorkerContext {
            queue: queue.clone(),
            ..h.ctx.clone()
        };
        queue.push(Task::new("one", "http://x/1")).unwrap();
        let handle = spawn_worker(1, &ctx).unwrap();
        assert_eq!(
            h.feedback_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Feedback::Success
        );
        closer.close();
        handle.join().unwrap();
        assert!(h.feedback_rx.try_recv().is_err());
    }
}
