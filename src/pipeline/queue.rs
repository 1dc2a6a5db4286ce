//! Bounded multi-producer, multi-consumer task queue with an explicit close.
//!
//! Workers hold a producer handle for retries, so the queue cannot be closed by dropping
//! senders. Instead a separate close channel is disconnected by dropping the [`QueueCloser`]
//! the supervisor owns; every blocked `pop` and `push` observes that disconnect.

use crossbeam_channel::{Receiver, Select, Sender, TryRecvError, bounded, select};

use crate::Task;
use crate::error::QueueClosed;

/// Cloneable handle to the queue, held by the supervisor and every worker.
#[derive(Clone)]
pub struct TaskQueue {
    tx: Sender<Task>,
    rx: Receiver<Task>,
    closed: Receiver<()>,
}

/// Close handle. Dropping it (or calling [`QueueCloser::close`]) closes the queue for everyone.
pub struct QueueCloser {
    _tx: Sender<()>,
}

impl QueueCloser {
    pub fn close(self) {}
}

/// Create a queue holding at most `capacity` tasks (at least one).
pub fn task_queue(capacity: usize) -> (TaskQueue, QueueCloser) {
    let (tx, rx) = bounded::<Task>(capacity.max(1));
    let (close_tx, closed) = bounded::<()>(0);
    (TaskQueue { tx, rx, closed }, QueueCloser { _tx: close_tx })
}

impl TaskQueue {
    pub fn is_closed(&self) -> bool {
        matches!(self.closed.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Enqueue, blocking while the queue is full. A closed queue hands the task back.
    pub fn push(&self, task: Task) -> Result<(), QueueClosed> {
        if self.is_closed() {
            return Err(QueueClosed(task));
        }
        let mut sel = Select::new();
        let send = sel.send(&self.tx);
        sel.recv(&self.closed);
        let oper = sel.select();
        if oper.index() == send {
            oper.send(&self.tx, task)
                .map_err(|e| QueueClosed(e.into_inner()))
        } else {
            let _ = oper.recv(&self.closed);
            Err(QueueClosed(task))
        }
    }

    /// Dequeue, blocking while the queue is empty and open. `None` once the queue is closed;
    /// tasks still buffered at that point are abandoned, even one that raced the close.
    pub fn pop(&self) -> Option<Task> {
        if self.is_closed() {
            return None;
        }
        select! {
            recv(self.rx) -> task => task.ok().filter(|_| !self.is_closed()),
            recv(self.closed) -> _ => None,
        }
    }

    /// Tasks currently buffered.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
