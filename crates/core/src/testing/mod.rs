//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every collaborator trait,
//! allowing the queue, normalizer and HTTP layer to be tested without a
//! subtitle provider, download managers or real video files.
//!
//! # Example
//!
//! ```rust,ignore
//! use subrecall_core::testing::{fixtures, MockHasher, MockIdentifier, MockSubtitleSource};
//!
//! let source = MockSubtitleSource::new(fixtures::weights());
//! source.add_candidate(fixtures::movie_candidate("1", "en", "Movie", Some(2016)), "1\n...").await;
//!
//! let collaborators = fixtures::collaborators(&source, MockIdentifier::new(), MockHasher::new());
//! ```

mod mock_managers;
mod mock_source;
mod mock_video;
mod recording_sink;

pub use mock_managers::{MockEpisodeManager, MockMovieManager};
pub use mock_source::{MockSubtitleSource, RecordedListing};
pub use mock_video::{MockHasher, MockIdentifier};
pub use recording_sink::RecordingSink;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use super::{MockHasher, MockIdentifier, MockSubtitleSource};
    use crate::queue::{Collaborators, WorkerSettings};
    use crate::scoring::{MatchAttribute, ScoreThresholds, ScoreWeights};
    use crate::source::SubtitleCandidate;
    use crate::video::{Identity, MediaTarget};

    /// Small round weights that make scenario scores easy to follow.
    ///
    /// Series + season + episode = 80, plus release group = 120.
    /// Title = 15, plus year = 45.
    pub fn weights() -> ScoreWeights {
        ScoreWeights::new()
            .with(MatchAttribute::Series, 40)
            .with(MatchAttribute::Season, 20)
            .with(MatchAttribute::Episode, 20)
            .with(MatchAttribute::ReleaseGroup, 40)
            .with(MatchAttribute::Title, 15)
            .with(MatchAttribute::Year, 30)
            .with(MatchAttribute::Hash, 200)
    }

    pub fn movie_identity(title: &str, year: Option<u32>) -> Identity {
        Identity::new(
            title,
            MediaTarget::Movie {
                title: title.to_string(),
                year,
            },
        )
    }

    pub fn episode_identity(series: &str, season: u32, episode: u32) -> Identity {
        Identity::new(
            format!("{} S{:02}E{:02}", series, season, episode),
            MediaTarget::Episode {
                series: series.to_string(),
                season,
                episode,
                title: None,
                year: None,
            },
        )
    }

    /// A candidate from the mock provider for a movie.
    pub fn movie_candidate(id: &str, language: &str, title: &str, year: Option<u32>) -> SubtitleCandidate {
        let mut candidate = SubtitleCandidate::new("mock", id, language);
        candidate.title = Some(title.to_string());
        candidate.year = year;
        candidate
    }

    /// A candidate from the mock provider for an episode.
    pub fn episode_candidate(
        id: &str,
        language: &str,
        series: &str,
        season: u32,
        episode: u32,
        release_group: Option<&str>,
    ) -> SubtitleCandidate {
        let mut candidate = SubtitleCandidate::new("mock", id, language);
        candidate.series = Some(series.to_string());
        candidate.season = Some(season);
        candidate.episode = Some(episode);
        candidate.release.release_group = release_group.map(str::to_string);
        candidate
    }

    /// Worker settings with the same thresholds for movies and episodes.
    pub fn settings(languages: &[&str], minimum: u32, desired: u32) -> WorkerSettings {
        WorkerSettings {
            languages: languages.iter().map(|l| l.to_string()).collect(),
            minimum: ScoreThresholds::new(minimum, minimum),
            desired: ScoreThresholds::new(desired, desired),
            search_for_days: 7,
        }
    }

    pub fn collaborators(
        source: &MockSubtitleSource,
        identifier: MockIdentifier,
        hasher: MockHasher,
    ) -> Collaborators {
        Collaborators {
            source: Arc::new(source.clone()),
            identifier: Arc::new(identifier),
            hasher: Arc::new(hasher),
        }
    }
}
