//! Periodic rechecker.
//!
//! Enqueues one [`Command::CheckForBetter`] per interval. The first check
//! happens one full interval after start.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::queue::{Command, CommandSink};

pub struct Rechecker {
    interval: Duration,
    sink: Arc<dyn CommandSink>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Rechecker {
    pub fn new(interval: Duration, sink: Arc<dyn CommandSink>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            interval,
            sink,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the timer loop (spawns a background task).
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Rechecker already running");
            return;
        }

        let interval = self.interval;
        let sink = Arc::clone(&self.sink);
        let running = Arc::clone(&self.running);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Rechecker started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("Rechecker received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        if let Err(e) = sink.enqueue(Command::CheckForBetter) {
                            error!(error = %e, "Could not enqueue recheck, stopping");
                            running.store(false, Ordering::SeqCst);
                            break;
                        }
                        debug!("Recheck enqueued");
                    }
                }
            }
            info!("Rechecker stopped");
        });

        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(task);
        }
    }

    /// Stop the timer loop and wait for it to exit.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("Rechecker not running");
        }
        let _ = self.shutdown_tx.send(());

        let task = self.task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}
