//! Sonarr API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, EpisodeManager, ManagerError, ResolvedFile};

/// Sonarr configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SonarrConfig {
    /// Base URL, e.g. "http://localhost:8989".
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Sonarr API client.
pub struct SonarrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SonarrClient {
    pub fn new(config: SonarrConfig) -> Result<Self, ManagerError> {
        if config.url.is_empty() {
            return Err(ManagerError::NotConfigured(
                "Sonarr URL is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ManagerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Sonarr request");

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;
        let response = check_status(response, path).await?;

        response.json().await.map_err(|e| {
            ManagerError::ParseError(format!("Failed to parse {} response: {}", path, e))
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodeResponse {
    #[serde(default)]
    episode_file_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EpisodeFileResponse {
    path: String,
    #[serde(default)]
    scene_name: Option<String>,
}

#[async_trait]
impl EpisodeManager for SonarrClient {
    async fn resolve_episode(&self, episode_id: u64) -> Result<ResolvedFile, ManagerError> {
        let episode: EpisodeResponse = self.get(&format!("/api/episode/{}", episode_id)).await?;
        if episode.episode_file_id == 0 {
            return Err(ManagerError::NotFound(format!(
                "No file for episode {}",
                episode_id
            )));
        }

        let file: EpisodeFileResponse = self
            .get(&format!("/api/episodefile/{}", episode.episode_file_id))
            .await?;

        Ok(ResolvedFile {
            path: file.path,
            scene_name: file.scene_name.filter(|s| !s.is_empty()),
        })
    }
}
