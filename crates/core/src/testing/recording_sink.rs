//! Command sink that records instead of executing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::queue::{Command, CommandSink, QueueError};

/// Records every enqueued command. After [`close`](Self::close) it rejects them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<Command>>,
    closed: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands enqueued so far, in order.
    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl CommandSink for RecordingSink {
    fn enqueue(&self, command: Command) -> Result<(), QueueError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
        Ok(())
    }
}
