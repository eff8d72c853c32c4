//! Derives a structured [`Identity`] from a release/display name.
//!
//! Scene names follow loose conventions (`Series.Title.S02E03.720p.WEB-DL.H264-Group`,
//! `Movie.Title.2016.1080p.BluRay.x264-Group`). The parser pulls out what it can and
//! falls back to a generic identity when neither an episode marker nor a year is found.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{Identity, MediaTarget, ReleaseInfo};

/// Collaborator that turns a display name into an identity.
pub trait MediaIdentifier: Send + Sync {
    fn identify(&self, name: &str) -> Identity;
}

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "wmv", "mov", "ts", "mpg", "webm"];

static EPISODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<series>.+?)[ ._\-]+s(?P<season>\d{1,2})[ ._\-]?e(?P<episode>\d{1,3})")
        .unwrap()
});
static EPISODE_X_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?P<series>.+?)[ ._\-]+(?P<season>\d{1,2})x(?P<episode>\d{2,3})\b").unwrap()
});
static MOVIE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<title>.+?)[ ._\-(\[]+(?P<year>(?:19|20)\d{2})(?:[ ._\-)\]]|$)").unwrap()
});
static SERIES_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<series>.+?)[ ._(]+(?P<year>(?:19|20)\d{2})\)?$").unwrap());
static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(2160p|1080p|1080i|720p|576p|480p)\b").unwrap());
static GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(?P<group>[A-Za-z0-9]+)$").unwrap());

/// Ordered so longer/more specific tokens win.
const FORMATS: &[(&str, &str)] = &[
    ("web-dl", "WEB-DL"),
    ("webdl", "WEB-DL"),
    ("webrip", "WEBRip"),
    ("bluray", "BluRay"),
    ("blu-ray", "BluRay"),
    ("brrip", "BluRay"),
    ("bdrip", "BluRay"),
    ("hdtv", "HDTV"),
    ("dvdrip", "DVD"),
    ("dvd", "DVD"),
];

const VIDEO_CODECS: &[(&str, &str)] = &[
    ("x264", "H.264"),
    ("h264", "H.264"),
    ("avc", "H.264"),
    ("x265", "H.265"),
    ("h265", "H.265"),
    ("hevc", "H.265"),
    ("xvid", "XviD"),
    ("divx", "DivX"),
];

const AUDIO_CODECS: &[(&str, &str)] = &[
    ("aac", "AAC"),
    ("ac3", "AC3"),
    ("dts", "DTS"),
    ("flac", "FLAC"),
    ("mp3", "MP3"),
];

/// Regex-based scene name parser.
#[derive(Debug, Default, Clone)]
pub struct SceneNameIdentifier;

impl SceneNameIdentifier {
    pub fn new() -> Self {
        Self
    }
}

impl MediaIdentifier for SceneNameIdentifier {
    fn identify(&self, name: &str) -> Identity {
        let stem = strip_video_extension(file_name(name));
        let target = parse_target(stem);
        let mut identity = Identity::new(name, target);
        identity.release = parse_release(stem);
        identity
    }
}

/// Extract shared release attributes from a scene name.
pub fn parse_release(name: &str) -> ReleaseInfo {
    let stem = strip_video_extension(file_name(name));
    let tokens: Vec<String> = stem
        .split(|c: char| c == '.' || c == ' ' || c == '_' || c == '[' || c == ']')
        .map(|t| t.to_lowercase())
        .collect();

    ReleaseInfo {
        release_group: GROUP_RE
            .captures(stem)
            .and_then(|c| c.name("group"))
            // "WEB-DL" at the end of a name is a format, not a group
            .filter(|m| !stem[..m.start()].to_lowercase().ends_with("web-"))
            .map(|m| m.as_str().to_string()),
        resolution: RESOLUTION_RE
            .captures(stem)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_lowercase()),
        format: lookup_token(&tokens, FORMATS),
        video_codec: lookup_token(&tokens, VIDEO_CODECS),
        audio_codec: lookup_token(&tokens, AUDIO_CODECS),
    }
}

fn parse_target(stem: &str) -> MediaTarget {
    let episode_caps = EPISODE_RE
        .captures(stem)
        .or_else(|| EPISODE_X_RE.captures(stem));

    if let Some(caps) = episode_caps {
        let raw_series = clean_title(&caps["series"]);
        let season = caps["season"].parse().unwrap_or(0);
        let episode = caps["episode"].parse().unwrap_or(0);

        let (series, year) = match SERIES_YEAR_RE.captures(&raw_series) {
            Some(y) => (
                clean_title(&y["series"]),
                y["year"].parse::<u32>().ok(),
            ),
            None => (raw_series, None),
        };

        return MediaTarget::Episode {
            series,
            season,
            episode,
            title: None,
            year,
        };
    }

    if let Some(caps) = MOVIE_RE.captures(stem) {
        return MediaTarget::Movie {
            title: clean_title(&caps["title"]),
            year: caps["year"].parse().ok(),
        };
    }

    MediaTarget::Generic
}

fn lookup_token(tokens: &[String], table: &[(&str, &str)]) -> Option<String> {
    table.iter().find_map(|(needle, canonical)| {
        tokens
            .iter()
            .any(|t| t == needle || t.split('-').any(|part| part == *needle))
            .then(|| canonical.to_string())
    })
}

fn file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn strip_video_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => stem,
        _ => name,
    }
}

fn clean_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ' ')
        .to_string()
}
