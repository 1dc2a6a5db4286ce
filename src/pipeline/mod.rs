//! Worker pool: task queue, workers, supervisor, and the run orchestration around them.

pub mod events;
pub mod orchestrator;
pub mod queue;
pub mod supervisor;
pub mod worker;

pub use events::{WorkerEvent, record_event};
pub use orchestrator::{collect_tasks, grab, log_summary};
pub use queue::{QueueCloser, TaskQueue, task_queue};
pub use supervisor::{AggregationState, Decision, run_pool};
pub use worker::{Step, WorkerContext, process_task, spawn_worker, worker_loop};
