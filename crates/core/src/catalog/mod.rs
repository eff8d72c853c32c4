//! Video catalog: tracked videos and their subtitle download history.
//!
//! Each path has exactly one current generation. Re-adding a path starts a
//! new generation and discards the downloads of the previous one.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalog;
pub use types::*;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::scoring::ScoreThresholds;
use crate::video::Identity;

/// Storage for tracked videos and downloads.
pub trait VideoCatalog: Send + Sync {
    /// Replace the identity for `path`, starting a new generation.
    ///
    /// Downloads of the prior generation are deleted in the same transaction.
    fn upsert_video(
        &self,
        path: &str,
        identity: &Identity,
        added_at: DateTime<Utc>,
    ) -> Result<(), CatalogError>;

    /// Record a download against the current generation of `path`.
    ///
    /// Fails with [`CatalogError::NotFound`] if `path` is not tracked.
    fn record_download(
        &self,
        path: &str,
        provider: &str,
        subtitle_id: &str,
        language: &str,
        score: u32,
    ) -> Result<(), CatalogError>;

    /// Downloads of the current generation grouped by language, best score first.
    fn downloads_for(&self, path: &str) -> Result<BTreeMap<String, Vec<DownloadRecord>>, CatalogError>;

    /// Videos added at or after `not_older_than` with at least one language
    /// below the desired threshold for their kind.
    fn incomplete_videos(
        &self,
        languages: &[String],
        desired: &ScoreThresholds,
        not_older_than: DateTime<Utc>,
    ) -> Result<Vec<IncompleteVideo>, CatalogError>;

    /// The current generation of `path`, if tracked.
    fn video(&self, path: &str) -> Result<Option<VideoRecord>, CatalogError>;
}
