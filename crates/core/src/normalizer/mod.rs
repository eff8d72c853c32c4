//! Turns inbound notifications into queue commands.
//!
//! Three shapes are accepted: a direct add, an episode manager event and a
//! movie manager event. Malformed payloads and ignored event types never
//! reach the queue.

mod events;
mod poller;

pub use events::{EpisodeEvent, EventEpisode, MovieEvent};
pub use poller::{poll_release_file, PollOutcome, PollSettings};

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::managers::{EpisodeManager, MovieManager};
use crate::queue::{Command, CommandSink, QueueError};

/// Errors rejecting an inbound notification.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("No {0} configured")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// What an episode event turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeOutcome {
    /// Event type is not acted on.
    Ignored,
    /// Number of episodes resolved and enqueued.
    Enqueued(usize),
}

pub struct EventNormalizer {
    sink: Arc<dyn CommandSink>,
    episode_manager: Option<Arc<dyn EpisodeManager>>,
    movie_manager: Option<(Arc<dyn MovieManager>, PollSettings)>,
}

impl EventNormalizer {
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self {
            sink,
            episode_manager: None,
            movie_manager: None,
        }
    }

    pub fn with_episode_manager(mut self, manager: Arc<dyn EpisodeManager>) -> Self {
        self.episode_manager = Some(manager);
        self
    }

    pub fn with_movie_manager(mut self, manager: Arc<dyn MovieManager>, poll: PollSettings) -> Self {
        self.movie_manager = Some((manager, poll));
        self
    }

    /// `{path, name?}` straight to an add. The name defaults to the path.
    pub fn handle_direct(&self, path: &str, name: Option<String>) -> Result<(), NormalizeError> {
        if path.trim().is_empty() {
            return Err(NormalizeError::InvalidPayload("path is empty".to_string()));
        }
        info!(path, name = ?name, "Direct add");
        self.sink.enqueue(Command::add_video(path, name))?;
        Ok(())
    }

    /// Resolve every episode of a download event and enqueue an add for each.
    ///
    /// Episodes whose lookup fails are logged and skipped.
    pub async fn handle_episode_event(
        &self,
        event: &EpisodeEvent,
    ) -> Result<EpisodeOutcome, NormalizeError> {
        if !event.is_download() {
            debug!(event_type = %event.event_type, "Ignoring episode event");
            return Ok(EpisodeOutcome::Ignored);
        }
        let manager = self
            .episode_manager
            .as_ref()
            .ok_or(NormalizeError::NotConfigured("episode manager"))?;

        let mut enqueued = 0;
        for episode in &event.episodes {
            match manager.resolve_episode(episode.id).await {
                Ok(file) => {
                    info!(episode_id = episode.id, path = %file.path, "Episode downloaded");
                    self.sink
                        .enqueue(Command::add_video(file.path, file.scene_name))?;
                    enqueued += 1;
                }
                Err(e) => {
                    warn!(episode_id = episode.id, error = %e, "Could not resolve episode file");
                }
            }
        }

        Ok(EpisodeOutcome::Enqueued(enqueued))
    }

    /// Start polling the movie manager for a downloaded movie's file.
    ///
    /// Returns `None` for messages that are not downloads. The poll runs as a
    /// detached task; the handle is only useful to tests.
    pub fn handle_movie_event(
        &self,
        event: &MovieEvent,
    ) -> Result<Option<JoinHandle<PollOutcome>>, NormalizeError> {
        if !event.is_download() {
            debug!(message = %event.message, "Ignoring movie event");
            return Ok(None);
        }
        let (manager, poll) = self
            .movie_manager
            .as_ref()
            .ok_or(NormalizeError::NotConfigured("movie manager"))?;
        if event.imdb_id.trim().is_empty() {
            return Err(NormalizeError::InvalidPayload("imdb_id is empty".to_string()));
        }

        info!(movie_id = %event.imdb_id, "Movie downloaded, polling for its file");
        let task = tokio::spawn(poll_release_file(
            Arc::clone(manager),
            Arc::clone(&self.sink),
            event.imdb_id.clone(),
            *poll,
        ));
        Ok(Some(task))
    }
}
