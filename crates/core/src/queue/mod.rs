//! Single-worker FIFO command queue.
//!
//! Every catalog mutation and subtitle-source round-trip happens inside the
//! worker, one command at a time, so a command's read-then-write sequence
//! never interleaves with another's.

mod command;
mod handle;
mod worker;

pub use command::{Command, CommandSink, QueueError};
pub use handle::{CommandQueue, QueueStatus};
pub use worker::{Collaborators, CommandError, CommandWorker, WorkerSettings};

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::catalog::VideoCatalog;

/// Create a command queue and its worker.
///
/// Returns:
/// - `CommandQueue` - for enqueuing commands (clone this to share across tasks)
/// - `CommandWorker` - spawn this as a background task with `tokio::spawn(worker.run())`
pub fn create_command_queue(
    catalog: Box<dyn VideoCatalog>,
    collaborators: Collaborators,
    settings: WorkerSettings,
) -> (CommandQueue, CommandWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(watch::channel(0).0);
    let counters = Arc::default();

    let queue = CommandQueue::new(tx, Arc::clone(&pending), Arc::clone(&counters));
    let worker = CommandWorker::new(rx, pending, counters, catalog, collaborators, settings);
    (queue, worker)
}
