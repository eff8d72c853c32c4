//! Types shared by subtitle sources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::video::ReleaseInfo;

/// A subtitle option returned by a source for an identity and language.
///
/// The descriptive fields are what the source knows about the release the
/// subtitle was made for; the scoring engine compares them to the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleCandidate {
    pub provider: String,
    pub subtitle_id: String,
    /// Language tag as configured (e.g. "en", "pt-BR").
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default)]
    pub release: ReleaseInfo,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hashes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl SubtitleCandidate {
    pub fn new(
        provider: impl Into<String>,
        subtitle_id: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            subtitle_id: subtitle_id.into(),
            language: language.into(),
            series: None,
            season: None,
            episode: None,
            title: None,
            year: None,
            release: ReleaseInfo::default(),
            hashes: BTreeMap::new(),
            size: None,
        }
    }
}

/// Errors from a subtitle source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Subtitle not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if e.is_connect() {
            SourceError::ConnectionFailed(e.to_string())
        } else if e.is_decode() {
            SourceError::ParseError(e.to_string())
        } else {
            SourceError::ConnectionFailed(e.to_string())
        }
    }
}
