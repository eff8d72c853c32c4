//! Mock episode and movie managers for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::managers::{EpisodeManager, ManagerError, MovieManager, ResolvedFile};

/// Mock implementation of the EpisodeManager trait.
///
/// Unknown episode ids resolve to [`ManagerError::NotFound`].
#[derive(Debug, Default)]
pub struct MockEpisodeManager {
    files: Arc<RwLock<HashMap<u64, ResolvedFile>>>,
    calls: Arc<RwLock<Vec<u64>>>,
}

impl MockEpisodeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `episode_id` resolve to `file`.
    pub async fn insert(&self, episode_id: u64, file: ResolvedFile) {
        self.files.write().await.insert(episode_id, file);
    }

    /// Episode ids looked up so far.
    pub async fn recorded_calls(&self) -> Vec<u64> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl EpisodeManager for MockEpisodeManager {
    async fn resolve_episode(&self, episode_id: u64) -> Result<ResolvedFile, ManagerError> {
        self.calls.write().await.push(episode_id);
        self.files
            .read()
            .await
            .get(&episode_id)
            .cloned()
            .ok_or_else(|| ManagerError::NotFound(format!("episode {}", episode_id)))
    }
}

/// Mock implementation of the MovieManager trait.
///
/// Responses are served in the order they were pushed. Once they run out,
/// every lookup reports that the release has no file yet.
#[derive(Debug, Default)]
pub struct MockMovieManager {
    responses: Arc<RwLock<VecDeque<Result<Option<ResolvedFile>, ManagerError>>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockMovieManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response for the next lookup.
    pub async fn push_response(&self, response: Result<Option<ResolvedFile>, ManagerError>) {
        self.responses.write().await.push_back(response);
    }

    /// Movie ids looked up so far.
    pub async fn recorded_calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl MovieManager for MockMovieManager {
    async fn release_file(&self, movie_id: &str) -> Result<Option<ResolvedFile>, ManagerError> {
        self.calls.write().await.push(movie_id.to_string());
        self.responses
            .write()
            .await
            .pop_front()
            .unwrap_or(Ok(None))
    }
}
