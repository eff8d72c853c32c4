//! CouchPotato API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_status, ManagerError, MovieManager, ResolvedFile};

/// CouchPotato configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchPotatoConfig {
    /// Base URL, e.g. "http://localhost:5050".
    pub url: String,
    pub api_key: String,
    /// How many times to ask for the release file after a download event.
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    /// Seconds between attempts.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_poll_attempts() -> u32 {
    10
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    30
}

/// CouchPotato API client.
pub struct CouchPotatoClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CouchPotatoClient {
    pub fn new(config: CouchPotatoConfig) -> Result<Self, ManagerError> {
        if config.url.is_empty() {
            return Err(ManagerError::NotConfigured(
                "CouchPotato URL is required".to_string(),
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
}

#[derive(Debug, Deserialize)]
struct MediaGetResponse {
    media: Option<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(default)]
    releases: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    info: Option<ReleaseInfo>,
    #[serde(default)]
    files: Option<ReleaseFiles>,
}

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFiles {
    #[serde(default)]
    movie: Vec<String>,
}

impl MediaGetResponse {
    fn release_file(self) -> Option<ResolvedFile> {
        self.media?.releases.into_iter().find_map(|release| {
            let path = release.files?.movie.into_iter().next()?;
            Some(ResolvedFile {
                path,
                scene_name: release.info.and_then(|i| i.name).filter(|n| !n.is_empty()),
            })
        })
    }
}

#[async_trait]
impl MovieManager for CouchPotatoClient {
    async fn release_file(&self, movie_id: &str) -> Result<Option<ResolvedFile>, ManagerError> {
        let url = format!(
            "{}/api/{}/media.get",
            self.base_url,
            urlencoding::encode(&self.api_key)
        );
        debug!(movie_id, "CouchPotato media.get");

        let response = self
            .client
            .get(&url)
            .query(&[("id", movie_id)])
            .send()
            .await?;
        let response = check_status(response, movie_id).await?;

        let media: MediaGetResponse = response.json().await.map_err(|e| {
            ManagerError::ParseError(format!("Failed to parse media.get response: {}", e))
        })?;

        Ok(media.release_file())
    }
}
