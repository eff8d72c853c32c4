//! Inbound webhook payloads.

use serde::{Deserialize, Serialize};

/// Episode manager webhook body (Sonarr "Download" notifications).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EpisodeEvent {
    pub event_type: String,
    #[serde(default)]
    pub episodes: Vec<EventEpisode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventEpisode {
    pub id: u64,
}

impl EpisodeEvent {
    /// Only completed downloads are acted on; test and rename probes are not.
    pub fn is_download(&self) -> bool {
        self.event_type.eq_ignore_ascii_case("download")
    }
}

/// Movie manager webhook body (CouchPotato, form encoded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieEvent {
    pub message: String,
    #[serde(default)]
    pub imdb_id: String,
}

impl MovieEvent {
    pub fn is_download(&self) -> bool {
        self.message.starts_with("Downloaded")
    }
}
