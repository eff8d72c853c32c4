//! Clients for the download managers that notify us about new videos.
//!
//! Episode managers (Sonarr) resolve an episode id to its file. Movie
//! managers (CouchPotato) resolve a movie id to the file of its latest
//! release, which may lag behind the webhook that announced it.

mod couchpotato;
mod sonarr;

pub use couchpotato::{CouchPotatoClient, CouchPotatoConfig};
pub use sonarr::{SonarrClient, SonarrConfig};

use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A video file reported by a manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFile {
    pub path: String,
    /// Original release name, when the manager kept it.
    pub scene_name: Option<String>,
}

/// Errors from manager API calls.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Manager not configured: {0}")]
    NotConfigured(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ManagerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ManagerError::Timeout
        } else if e.is_decode() {
            ManagerError::ParseError(e.to_string())
        } else {
            ManagerError::ConnectionFailed(e.to_string())
        }
    }
}

/// Episode manager (e.g. Sonarr).
#[async_trait]
pub trait EpisodeManager: Send + Sync {
    /// Resolve an episode id to its file: episode, then episode file.
    async fn resolve_episode(&self, episode_id: u64) -> Result<ResolvedFile, ManagerError>;
}

/// Movie manager (e.g. CouchPotato).
#[async_trait]
pub trait MovieManager: Send + Sync {
    /// File of the first release of `movie_id` that has one.
    ///
    /// `Ok(None)` means the manager knows the movie but has no file yet.
    async fn release_file(&self, movie_id: &str) -> Result<Option<ResolvedFile>, ManagerError>;
}

async fn check_status(response: Response, what: &str) -> Result<Response, ManagerError> {
    let status = response.status();
    if status == 404 {
        return Err(ManagerError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ManagerError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}
