//! Candidate scoring and best-candidate selection.

use std::collections::BTreeSet;

use crate::catalog::DownloadRecord;
use crate::source::SubtitleCandidate;
use crate::video::{Identity, MediaTarget};

use super::types::{MatchAttribute, ScoreWeights};

/// Outcome of [`select_best`]. `candidate` is `None` (and `score` 0) when
/// nothing was left to choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    pub candidate: Option<&'a SubtitleCandidate>,
    pub score: u32,
}

impl Selection<'_> {
    pub fn none() -> Self {
        Self {
            candidate: None,
            score: 0,
        }
    }
}

/// Attributes of `identity` that `candidate` matches.
pub fn matched_attributes(identity: &Identity, candidate: &SubtitleCandidate) -> BTreeSet<MatchAttribute> {
    let mut matches = BTreeSet::new();

    if let MediaTarget::Episode {
        series,
        season,
        episode,
        ..
    } = &identity.target
    {
        if same_text(Some(series), candidate.series.as_deref()) {
            matches.insert(MatchAttribute::Series);
        }
        if candidate.season == Some(*season) {
            matches.insert(MatchAttribute::Season);
        }
        if candidate.episode == Some(*episode) {
            matches.insert(MatchAttribute::Episode);
        }
    }

    if same_text(identity.title(), candidate.title.as_deref()) {
        matches.insert(MatchAttribute::Title);
    }
    if identity.year().is_some() && identity.year() == candidate.year {
        matches.insert(MatchAttribute::Year);
    }

    let ours = &identity.release;
    let theirs = &candidate.release;
    let shared = [
        (MatchAttribute::ReleaseGroup, &ours.release_group, &theirs.release_group),
        (MatchAttribute::Resolution, &ours.resolution, &theirs.resolution),
        (MatchAttribute::Format, &ours.format, &theirs.format),
        (MatchAttribute::VideoCodec, &ours.video_codec, &theirs.video_codec),
        (MatchAttribute::AudioCodec, &ours.audio_codec, &theirs.audio_codec),
    ];
    for (attribute, ours, theirs) in shared {
        if same_text(ours.as_deref(), theirs.as_deref()) {
            matches.insert(attribute);
        }
    }

    if hash_matches(identity, candidate) {
        matches.insert(MatchAttribute::Hash);
    }

    matches
}

/// Sum of the weights of every matched attribute.
pub fn score_candidate(identity: &Identity, candidate: &SubtitleCandidate, weights: &ScoreWeights) -> u32 {
    matched_attributes(identity, candidate)
        .into_iter()
        .map(|attribute| weights.weight(attribute))
        .sum()
}

/// Pick the highest-scoring candidate in `language` that has not been downloaded before.
///
/// Each candidate is scored with the weights `weights_for` returns for its
/// provider; candidates from a provider without weights are skipped.
/// Ties go to the candidate that appears first.
pub fn select_best<'a, F>(
    identity: &Identity,
    language: &str,
    candidates: &'a [SubtitleCandidate],
    already_downloaded: &[DownloadRecord],
    weights_for: F,
) -> Selection<'a>
where
    F: Fn(&str) -> Option<ScoreWeights>,
{
    let mut best = Selection::none();

    let fresh = candidates.iter().filter(|candidate| {
        candidate.language == language
            && !already_downloaded.iter().any(|d| {
                d.provider == candidate.provider
                    && d.subtitle_id == candidate.subtitle_id
                    && d.language == candidate.language
            })
    });

    for candidate in fresh {
        let Some(weights) = weights_for(&candidate.provider) else {
            continue;
        };
        let score = score_candidate(identity, candidate, &weights);
        if best.candidate.is_none() || score > best.score {
            best = Selection {
                candidate: Some(candidate),
                score,
            };
        }
    }

    best
}

fn same_text(ours: Option<&str>, theirs: Option<&str>) -> bool {
    match (ours, theirs) {
        (Some(a), Some(b)) => {
            let a = normalize(a);
            !a.is_empty() && a == normalize(b)
        }
        _ => false,
    }
}

fn normalize(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn hash_matches(identity: &Identity, candidate: &SubtitleCandidate) -> bool {
    let same_size = matches!((identity.size, candidate.size), (Some(a), Some(b)) if a == b);
    same_size
        && identity
            .hashes
            .iter()
            .any(|(algorithm, value)| candidate.hashes.get(algorithm) == Some(value))
}
