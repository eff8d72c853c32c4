//! Video identity model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of video, used to pick thresholds and required identity fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoKind {
    Movie,
    Episode,
    Generic,
}

impl VideoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoKind::Movie => "movie",
            VideoKind::Episode => "episode",
            VideoKind::Generic => "generic",
        }
    }
}

impl std::fmt::Display for VideoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VideoKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(VideoKind::Movie),
            "episode" => Ok(VideoKind::Episode),
            "generic" => Ok(VideoKind::Generic),
            other => Err(format!("unknown video kind: {}", other)),
        }
    }
}

/// Kind-specific identity fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaTarget {
    Movie {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        year: Option<u32>,
    },
    Episode {
        series: String,
        season: u32,
        episode: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        year: Option<u32>,
    },
    Generic,
}

/// Release attributes shared by every kind of video.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_group: Option<String>,
    /// e.g. "720p", "1080p".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Source format, e.g. "WEB-DL", "BluRay".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
}

/// Structured descriptor of a video used to match subtitle candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name the identity was derived from.
    pub name: String,
    #[serde(flatten)]
    pub target: MediaTarget,
    #[serde(default)]
    pub release: ReleaseInfo,
    /// File size in bytes, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Content hashes keyed by algorithm name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hashes: BTreeMap<String, String>,
}

impl Identity {
    pub fn new(name: impl Into<String>, target: MediaTarget) -> Self {
        Self {
            name: name.into(),
            target,
            release: ReleaseInfo::default(),
            size: None,
            hashes: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> VideoKind {
        match self.target {
            MediaTarget::Movie { .. } => VideoKind::Movie,
            MediaTarget::Episode { .. } => VideoKind::Episode,
            MediaTarget::Generic => VideoKind::Generic,
        }
    }

    /// Title of the movie or episode, if any.
    pub fn title(&self) -> Option<&str> {
        match &self.target {
            MediaTarget::Movie { title, .. } => Some(title),
            MediaTarget::Episode { title, .. } => title.as_deref(),
            MediaTarget::Generic => None,
        }
    }

    pub fn year(&self) -> Option<u32> {
        match &self.target {
            MediaTarget::Movie { year, .. } | MediaTarget::Episode { year, .. } => *year,
            MediaTarget::Generic => None,
        }
    }

    /// Attach content hashes and size computed from the file on disk.
    pub fn with_content(mut self, content: ContentHashes) -> Self {
        self.size = Some(content.size);
        self.hashes = content.hashes;
        self
    }
}

/// Result of hashing a video file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHashes {
    pub size: u64,
    pub hashes: BTreeMap<String, String>,
}
