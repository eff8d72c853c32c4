//! Polls a movie manager until a downloaded release exposes its file.
//!
//! Movie managers may acknowledge a download before their own records list
//! the file, so the lookup is retried a bounded number of times.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::managers::MovieManager;
use crate::queue::{Command, CommandSink};

/// Bounded polling: `attempts` lookups, `interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollSettings {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Found the file and enqueued an add for it.
    Enqueued { path: String },
    /// Found the file but the queue was closed.
    QueueClosed { path: String },
    /// No file after every attempt.
    GaveUp { attempts: u32 },
}

/// Look up the release file of `movie_id`, enqueuing an add as soon as one appears.
///
/// The first lookup happens immediately. Lookup errors count as attempts.
pub async fn poll_release_file(
    manager: Arc<dyn MovieManager>,
    sink: Arc<dyn CommandSink>,
    movie_id: String,
    settings: PollSettings,
) -> PollOutcome {
    for attempt in 1..=settings.attempts {
        match manager.release_file(&movie_id).await {
            Ok(Some(file)) => {
                info!(movie_id = %movie_id, attempt, path = %file.path, "Release file found");
                let path = file.path.clone();
                return match sink.enqueue(Command::add_video(file.path, file.scene_name)) {
                    Ok(()) => PollOutcome::Enqueued { path },
                    Err(e) => {
                        error!(movie_id = %movie_id, error = %e, "Could not enqueue release file");
                        PollOutcome::QueueClosed { path }
                    }
                };
            }
            Ok(None) => {
                debug!(movie_id = %movie_id, attempt, "Release has no file yet");
            }
            Err(e) => {
                warn!(movie_id = %movie_id, attempt, error = %e, "Release lookup failed");
            }
        }

        if attempt < settings.attempts {
            tokio::time::sleep(settings.interval).await;
        }
    }

    error!(
        movie_id = %movie_id,
        attempts = settings.attempts,
        "Gave up waiting for release file"
    );
    PollOutcome::GaveUp {
        attempts: settings.attempts,
    }
}
