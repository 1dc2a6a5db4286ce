//! Worker status events. Workers never log directly; they send these to the supervisor,
//! which drains them next to the feedback channel and turns them into log lines.

use log::{debug, error, info, warn};

use crate::RunReport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerEvent {
    Started { worker: usize, name: String, attempt: u32 },
    BackingOff { worker: usize, name: String, attempt: u32 },
    AlreadyPresent { worker: usize, name: String },
    Downloaded { worker: usize, name: String, bytes: u64 },
    TransferFailed {
        worker: usize,
        name: String,
        attempt: u32,
        error: String,
        will_retry: bool,
    },
    GaveUp { worker: usize, name: String, attempts: u32 },
    /// A retry could not be re-enqueued because the queue was already closed.
    Dropped { worker: usize, name: String },
    Died { worker: usize, error: String },
}

/// Log one event and fold it into the counters that are not driven by feedback.
pub fn record_event(event: &WorkerEvent, report: &mut RunReport) {
    match event {
        WorkerEvent::Started {
            worker,
            name,
            attempt,
        } => {
            if *attempt == 0 {
                info!("[w{worker}] start downloading {name:?}");
            } else {
                info!("[w{worker}] start downloading {name:?} (attempt {})", attempt + 1);
            }
        }
        WorkerEvent::BackingOff {
            worker,
            name,
            attempt,
        } => {
            report.backoffs += 1;
            debug!("[w{worker}] {name:?}: backing off before attempt {}", attempt + 1);
        }
        WorkerEvent::AlreadyPresent { worker, name } => {
            info!("[w{worker}] {name:?} already exists");
        }
        WorkerEvent::Downloaded {
            worker,
            name,
            bytes,
        } => {
            info!("[w{worker}] {name:?} downloaded ({bytes} bytes)");
        }
        WorkerEvent::TransferFailed {
            worker,
            name,
            attempt,
            error,
            will_retry,
        } => {
            report.transfer_failures += 1;
            if *will_retry {
                warn!("[w{worker}] failed download {name:?} (attempt {}): {error}", attempt + 1);
            } else {
                error!("[w{worker}] failed download {name:?}: {error}");
            }
        }
        WorkerEvent::GaveUp {
            worker,
            name,
            attempts,
        } => {
            error!("[w{worker}] failed download {name:?}: too many attempts ({attempts})");
        }
        WorkerEvent::Dropped { worker, name } => {
            warn!("[w{worker}] queue closed, retry of {name:?} dropped");
        }
        WorkerEvent::Died { worker, error } => {
            error!("[w{worker}] worker dead: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_follow_events() {
        let mut report = RunReport::default();
        record_event(
            &WorkerEvent::BackingOff {
                worker: 0,
                name: "e".into(),
                attempt: 1,
            },
            &mut report,
        );
        record_event(
            &WorkerEvent::TransferFailed {
                worker: 0,
                name: "e".into(),
                attempt: 0,
                error: "reset".into(),
                will_retry: true,
            },
            &mut report,
        );
        record_event(
            &WorkerEvent::Downloaded {
                worker: 0,
                name: "e".into(),
                bytes: 10,
            },
            &mut report,
        );
        assert_eq!(report.backoffs, 1);
        assert_eq!(report.transfer_failures, 1);
        assert_eq!(report.downloaded, 0);
    }
}
