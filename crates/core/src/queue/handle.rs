use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use super::{Command, CommandSink, QueueError};

/// Counters shared between the queue handles and the worker.
#[derive(Debug, Default)]
pub(crate) struct QueueCounters {
    pub processed: AtomicU64,
    pub failed: AtomicU64,
}

/// Snapshot of queue activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Commands queued or in flight.
    pub pending: usize,
    /// Commands that completed successfully.
    pub processed: u64,
    /// Commands that failed.
    pub failed: u64,
}

/// Handle for enqueuing commands.
///
/// Cheaply cloneable. The worker stops once every handle has been dropped.
#[derive(Clone)]
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<Command>,
    pending: Arc<watch::Sender<usize>>,
    counters: Arc<QueueCounters>,
}

impl CommandQueue {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Command>,
        pending: Arc<watch::Sender<usize>>,
        counters: Arc<QueueCounters>,
    ) -> Self {
        Self {
            tx,
            pending,
            counters,
        }
    }

    /// Wait until the queue is empty and the in-flight command (if any) has completed.
    pub async fn drain(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|pending| *pending == 0).await;
    }

    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            pending: *self.pending.borrow(),
            processed: self.counters.processed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl CommandSink for CommandQueue {
    fn enqueue(&self, command: Command) -> Result<(), QueueError> {
        // Count before sending so the worker can never decrement first.
        self.pending.send_modify(|pending| *pending += 1);
        if self.tx.send(command).is_err() {
            self.pending
                .send_modify(|pending| *pending = pending.saturating_sub(1));
            return Err(QueueError::Closed);
        }
        Ok(())
    }
}
