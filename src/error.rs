//! Typed errors for the places callers branch on the failure kind.
//! Everything else propagates as `anyhow::Error`.

use std::any::Any;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::Task;

/// Why no download URL could be taken from an item's content.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("content url not found")]
    ContentUrlNotFound,

    #[error("invalid feed item: <{tag}> has {found} attributes, expected {expected}")]
    InvalidFeed {
        tag: String,
        found: usize,
        expected: usize,
    },

    #[error("<{tag}> has no {attr} attribute")]
    MissingSource { tag: String, attr: String },
}

/// Failure of a single transfer attempt.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("connect to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("cannot create {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("stream into {} failed: {source}", path.display())]
    Stream { path: PathBuf, source: io::Error },

    #[error("cannot move {} into place: {message}", path.display())]
    Finalize { path: PathBuf, message: String },

    /// The output was created by someone else while this copy was streaming.
    #[error("{} already exists", path.display())]
    Exists { path: PathBuf },
}

impl TransferError {
    /// Everything except a failed create or a lost race to the output is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TransferError::Create { .. } | TransferError::Exists { .. }
        )
    }
}

/// Unexpected fault (panic) caught while a worker processed a task.
#[derive(Debug, Error)]
#[error("worker {worker} died while processing {task:?}: {message}")]
pub struct WorkerFault {
    pub worker: usize,
    pub task: String,
    pub message: String,
}

impl WorkerFault {
    /// Build from a `catch_unwind` payload; panics carry `&str` or `String` in practice.
    pub fn from_panic(worker: usize, task: &str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self {
            worker,
            task: task.to_string(),
            message,
        }
    }
}

/// Returned by a push on a closed queue; hands the task back to the caller.
#[derive(Debug, Error)]
#[error("task queue closed, dropping {:?}", .0.name)]
pub struct QueueClosed(pub Task);
