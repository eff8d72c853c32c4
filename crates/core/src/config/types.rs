use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::managers::{CouchPotatoConfig, SonarrConfig};
use crate::normalizer::PollSettings;
use crate::queue::WorkerSettings;
use crate::scoring::ScoreThresholds;
use crate::source::OpenSubtitlesConfig;

/// Provider names `[subtitles] providers` may list.
pub const KNOWN_PROVIDERS: &[&str] = &["opensubtitles"];

/// Longest recheck window `search_for_days` accepts, about a century.
pub const MAX_SEARCH_FOR_DAYS: u32 = 36_500;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub subtitles: SubtitlesConfig,
    #[serde(default)]
    pub opensubtitles: Option<OpenSubtitlesConfig>,
    #[serde(default)]
    pub sonarr: Option<SonarrConfig>,
    #[serde(default)]
    pub couchpotato: Option<CouchPotatoConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    5000
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("subrecall.db")
}

/// Subtitle acquisition policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubtitlesConfig {
    /// Language tags to fetch, e.g. ["en", "pt-BR"]
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Providers to search, in order. Earlier providers win score ties.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    /// Hours between rechecks
    #[serde(default = "default_search_interval_hours")]
    pub search_interval_hours: u64,
    /// Videos added longer ago than this are no longer rechecked
    #[serde(default = "default_search_for_days")]
    pub search_for_days: u32,
    #[serde(default = "default_min_movie_score")]
    pub min_movie_score: u32,
    #[serde(default = "default_min_episode_score")]
    pub min_episode_score: u32,
    #[serde(default = "default_desired_movie_score")]
    pub desired_movie_score: u32,
    #[serde(default = "default_desired_episode_score")]
    pub desired_episode_score: u32,
}

impl Default for SubtitlesConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            providers: default_providers(),
            search_interval_hours: default_search_interval_hours(),
            search_for_days: default_search_for_days(),
            min_movie_score: default_min_movie_score(),
            min_episode_score: default_min_episode_score(),
            desired_movie_score: default_desired_movie_score(),
            desired_episode_score: default_desired_episode_score(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

fn default_providers() -> Vec<String> {
    vec!["opensubtitles".to_string()]
}

fn default_search_interval_hours() -> u64 {
    24
}

fn default_search_for_days() -> u32 {
    7
}

fn default_min_movie_score() -> u32 {
    62
}

fn default_min_episode_score() -> u32 {
    137
}

fn default_desired_movie_score() -> u32 {
    88
}

fn default_desired_episode_score() -> u32 {
    204
}

impl SubtitlesConfig {
    pub fn minimum(&self) -> ScoreThresholds {
        ScoreThresholds::new(self.min_movie_score, self.min_episode_score)
    }

    pub fn desired(&self) -> ScoreThresholds {
        ScoreThresholds::new(self.desired_movie_score, self.desired_episode_score)
    }

    pub fn search_interval(&self) -> Duration {
        Duration::from_secs(self.search_interval_hours.saturating_mul(60 * 60))
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            languages: self.languages.clone(),
            minimum: self.minimum(),
            desired: self.desired(),
            search_for_days: self.search_for_days,
        }
    }
}

impl CouchPotatoConfig {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::new(
            self.poll_attempts,
            Duration::from_secs(self.poll_interval_secs),
        )
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub subtitles: SubtitlesConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opensubtitles: Option<SanitizedOpenSubtitlesConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sonarr: Option<SanitizedManagerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub couchpotato: Option<SanitizedCouchPotatoConfig>,
}

/// Sanitized OpenSubtitles config (API key and password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOpenSubtitlesConfig {
    pub api_key_configured: bool,
    pub login_configured: bool,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

/// Sanitized manager config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedManagerConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCouchPotatoConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub poll_attempts: u32,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            subtitles: config.subtitles.clone(),
            opensubtitles: config
                .opensubtitles
                .as_ref()
                .map(|o| SanitizedOpenSubtitlesConfig {
                    api_key_configured: !o.api_key.is_empty(),
                    login_configured: o.username.is_some() && o.password.is_some(),
                    user_agent: o.user_agent.clone(),
                    base_url: o.base_url.clone(),
                    timeout_secs: o.timeout_secs,
                }),
            sonarr: config.sonarr.as_ref().map(|s| SanitizedManagerConfig {
                url: s.url.clone(),
                api_key_configured: !s.api_key.is_empty(),
                timeout_secs: s.timeout_secs,
            }),
            couchpotato: config
                .couchpotato
                .as_ref()
                .map(|c| SanitizedCouchPotatoConfig {
                    url: c.url.clone(),
                    api_key_configured: !c.api_key.is_empty(),
                    poll_attempts: c.poll_attempts,
                    poll_interval_secs: c.poll_interval_secs,
                    timeout_secs: c.timeout_secs,
                }),
        }
    }
}
