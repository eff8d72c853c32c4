//! OpenSubtitles.com REST API (v1) source.
//!
//! Every command gets its own session: an optional login on open and a
//! logout on close.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{SourceError, SubtitleCandidate, SubtitleSession, SubtitleSource};
use crate::scoring::{MatchAttribute, ScoreWeights};
use crate::video::{parse_release, Identity, MediaTarget, VideoKind, OPENSUBTITLES_HASH};

const PROVIDER: &str = "opensubtitles";
const DEFAULT_BASE_URL: &str = "https://api.opensubtitles.com/api/v1";

/// OpenSubtitles configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSubtitlesConfig {
    /// Consumer API key (required).
    pub api_key: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Account login. Anonymous sessions are used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Base URL (default: https://api.opensubtitles.com/api/v1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    format!("subrecall v{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

/// Standard per-kind weights. A hash match alone reaches the default minimum.
pub fn standard_weights(kind: VideoKind) -> ScoreWeights {
    match kind {
        VideoKind::Episode => [
            (MatchAttribute::Hash, 137),
            (MatchAttribute::Series, 44),
            (MatchAttribute::Season, 20),
            (MatchAttribute::Episode, 20),
            (MatchAttribute::Title, 12),
            (MatchAttribute::ReleaseGroup, 15),
            (MatchAttribute::Format, 7),
            (MatchAttribute::Resolution, 2),
            (MatchAttribute::VideoCodec, 2),
            (MatchAttribute::AudioCodec, 2),
        ]
        .into_iter()
        .collect(),
        VideoKind::Movie | VideoKind::Generic => [
            (MatchAttribute::Hash, 62),
            (MatchAttribute::Title, 23),
            (MatchAttribute::Year, 12),
            (MatchAttribute::ReleaseGroup, 11),
            (MatchAttribute::Format, 6),
            (MatchAttribute::Resolution, 2),
            (MatchAttribute::VideoCodec, 2),
            (MatchAttribute::AudioCodec, 2),
        ]
        .into_iter()
        .collect(),
    }
}

/// OpenSubtitles subtitle source.
pub struct OpenSubtitlesSource {
    client: Client,
    base_url: String,
    api_key: String,
    user_agent: String,
    credentials: Option<(String, String)>,
}

impl OpenSubtitlesSource {
    pub fn new(config: OpenSubtitlesConfig) -> Result<Self, SourceError> {
        if config.api_key.is_empty() {
            return Err(SourceError::AuthFailed(
                "OpenSubtitles API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let credentials = match (config.username, config.password) {
            (Some(u), Some(p)) if !u.is_empty() => Some((u, p)),
            _ => None,
        };

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            user_agent: config.user_agent,
            credentials,
        })
    }
}

#[async_trait]
impl SubtitleSource for OpenSubtitlesSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn score_weights(&self, provider: &str, kind: VideoKind) -> Option<ScoreWeights> {
        (provider == PROVIDER).then(|| standard_weights(kind))
    }

    async fn open_session(&self) -> Result<Box<dyn SubtitleSession>, SourceError> {
        let mut session = OpenSubtitlesSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            user_agent: self.user_agent.clone(),
            token: None,
        };

        if let Some((username, password)) = &self.credentials {
            session.login(username, password).await?;
        }

        Ok(Box::new(session))
    }
}

struct OpenSubtitlesSession {
    client: Client,
    base_url: String,
    api_key: String,
    user_agent: String,
    token: Option<String>,
}

impl OpenSubtitlesSession {
    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .header("Api-Key", &self.api_key)
            .header("User-Agent", &self.user_agent);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<(), SourceError> {
        let url = format!("{}/login", self.base_url);
        let response = self
            .request(self.client.post(&url))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        if response.status() == 401 {
            return Err(SourceError::AuthFailed("Invalid credentials".to_string()));
        }
        let response = check_status(response).await?;

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(format!("Failed to parse login response: {}", e)))?;

        if let Some(host) = login.base_url.filter(|h| !h.is_empty()) {
            self.base_url = with_host(&self.base_url, &host);
        }
        self.token = Some(login.token);
        info!(provider = PROVIDER, "Logged in");
        Ok(())
    }
}

#[async_trait]
impl SubtitleSession for OpenSubtitlesSession {
    async fn list_candidates(
        &mut self,
        identity: &Identity,
        languages: &[String],
    ) -> Result<Vec<SubtitleCandidate>, SourceError> {
        let url = format!("{}/subtitles", self.base_url);
        let query = search_query(identity, languages);

        debug!(provider = PROVIDER, ?query, "Searching subtitles");

        let response = self
            .request(self.client.get(&url))
            .query(&query)
            .send()
            .await?;
        let response = check_status(response).await?;

        let search: SearchResponse = response.json().await.map_err(|e| {
            SourceError::ParseError(format!("Failed to parse search response: {}", e))
        })?;

        Ok(search
            .data
            .into_iter()
            .filter_map(|result| to_candidate(result, identity, languages))
            .collect())
    }

    async fn fetch_content(&mut self, candidate: &SubtitleCandidate) -> Result<Vec<u8>, SourceError> {
        let file_id: i64 = candidate.subtitle_id.parse().map_err(|_| {
            SourceError::NotFound(format!("Invalid file id: {}", candidate.subtitle_id))
        })?;

        let url = format!("{}/download", self.base_url);
        let response = self
            .request(self.client.post(&url))
            .json(&serde_json::json!({ "file_id": file_id }))
            .send()
            .await?;
        let response = check_status(response).await?;

        let download: DownloadResponse = response.json().await.map_err(|e| {
            SourceError::ParseError(format!("Failed to parse download response: {}", e))
        })?;

        debug!(provider = PROVIDER, file_id, remaining = ?download.remaining, "Fetching subtitle file");

        let response = check_status(self.client.get(&download.link).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn close(self: Box<Self>) {
        if self.token.is_none() {
            return;
        }
        let url = format!("{}/logout", self.base_url);
        match self.request(self.client.delete(&url)).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(provider = PROVIDER, "Logged out");
            }
            Ok(response) => {
                warn!(provider = PROVIDER, status = %response.status(), "Logout rejected");
            }
            Err(e) => {
                warn!(provider = PROVIDER, error = %e, "Logout failed");
            }
        }
    }
}

/// Swap the host of `url` for the account-specific one handed out at login.
fn with_host(url: &str, host: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("https", url));
    let path = rest.find('/').map(|i| &rest[i..]).unwrap_or("");
    format!("{}://{}{}", scheme, host, path)
}

async fn check_status(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status == 429 {
        return Err(SourceError::RateLimited);
    }
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::AuthFailed(body));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}

fn search_query(identity: &Identity, languages: &[String]) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();

    match &identity.target {
        MediaTarget::Episode {
            series,
            season,
            episode,
            ..
        } => {
            query.push(("query", series.clone()));
            query.push(("season_number", season.to_string()));
            query.push(("episode_number", episode.to_string()));
            query.push(("type", "episode".to_string()));
        }
        MediaTarget::Movie { title, year } => {
            query.push(("query", title.clone()));
            if let Some(year) = year {
                query.push(("year", year.to_string()));
            }
            query.push(("type", "movie".to_string()));
        }
        MediaTarget::Generic => query.push(("query", identity.name.clone())),
    }

    if let Some(hash) = identity.hashes.get(OPENSUBTITLES_HASH) {
        query.push(("moviehash", hash.clone()));
    }

    let mut codes: Vec<String> = languages.iter().map(|l| l.to_lowercase()).collect();
    codes.sort();
    codes.dedup();
    query.push(("languages", codes.join(",")));

    query
}

fn to_candidate(
    result: SearchResult,
    identity: &Identity,
    languages: &[String],
) -> Option<SubtitleCandidate> {
    let attributes = result.attributes;
    let returned = attributes.language?;
    // Map the API's lowercase code back to the configured tag.
    let language = languages
        .iter()
        .find(|l| l.eq_ignore_ascii_case(&returned))?
        .clone();
    let file_id = attributes.files.first()?.file_id;

    let mut candidate = SubtitleCandidate::new(PROVIDER, file_id.to_string(), language);

    if let Some(details) = attributes.feature_details {
        candidate.year = details.year.and_then(|y| u32::try_from(y).ok());
        candidate.season = details.season_number.and_then(|s| u32::try_from(s).ok());
        candidate.episode = details.episode_number.and_then(|e| u32::try_from(e).ok());
        if details.parent_title.is_some() {
            candidate.series = details.parent_title;
            candidate.title = details.title;
        } else {
            candidate.title = details.title;
        }
    }

    if let Some(release) = attributes.release.as_deref() {
        candidate.release = parse_release(release);
    }

    if attributes.moviehash_match.unwrap_or(false) {
        if let Some(hash) = identity.hashes.get(OPENSUBTITLES_HASH) {
            candidate
                .hashes
                .insert(OPENSUBTITLES_HASH.to_string(), hash.clone());
            candidate.size = identity.size;
        }
    }

    Some(candidate)
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    attributes: SearchAttributes,
}

#[derive(Debug, Deserialize)]
struct SearchAttributes {
    language: Option<String>,
    release: Option<String>,
    moviehash_match: Option<bool>,
    feature_details: Option<FeatureDetails>,
    #[serde(default)]
    files: Vec<SubtitleFile>,
}

#[derive(Debug, Deserialize)]
struct FeatureDetails {
    title: Option<String>,
    year: Option<i32>,
    season_number: Option<i32>,
    episode_number: Option<i32>,
    parent_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubtitleFile {
    file_id: i64,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    link: String,
    #[serde(default)]
    remaining: Option<i64>,
}
