//! Catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::video::Identity;

/// The current generation of a tracked video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub path: String,
    pub identity: Identity,
    pub added_at: DateTime<Utc>,
}

/// A subtitle downloaded for the current generation of a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub provider: String,
    pub subtitle_id: String,
    pub language: String,
    pub score: u32,
    pub downloaded_at: DateTime<Utc>,
}

/// A language whose best recorded score is below the desired threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Need {
    pub language: String,
    /// Best recorded score, 0 when nothing was downloaded yet.
    pub current_score: u32,
}

/// A video with at least one [`Need`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncompleteVideo {
    pub path: String,
    pub identity: Identity,
    pub needs: Vec<Need>,
}

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        CatalogError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Serialization(e.to_string())
    }
}
