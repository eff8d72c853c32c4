//! Subtitle sources.
//!
//! A [`SubtitleSource`] is long-lived and configured once at startup. Each queued
//! command opens its own [`SubtitleSession`] and closes it when the command is done.
//! Several providers are combined with a [`ProviderPool`].

mod opensubtitles;
mod pool;
mod types;

pub use opensubtitles::{standard_weights, OpenSubtitlesConfig, OpenSubtitlesSource};
pub use pool::ProviderPool;
pub use types::*;

use async_trait::async_trait;

use crate::scoring::ScoreWeights;
use crate::video::{Identity, VideoKind};

/// Factory for per-command subtitle sessions.
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    /// Source name. Candidates of a single provider carry it as their `provider`.
    fn name(&self) -> &str;

    /// Per-attribute weights for candidates of `provider` on a kind of video.
    ///
    /// `None` if this source does not produce candidates for `provider`.
    fn score_weights(&self, provider: &str, kind: VideoKind) -> Option<ScoreWeights>;

    /// Open a session for the duration of one command.
    async fn open_session(&self) -> Result<Box<dyn SubtitleSession>, SourceError>;
}

/// A live connection to a subtitle source.
#[async_trait]
pub trait SubtitleSession: Send {
    /// List candidate subtitles for an identity in the given languages.
    async fn list_candidates(
        &mut self,
        identity: &Identity,
        languages: &[String],
    ) -> Result<Vec<SubtitleCandidate>, SourceError>;

    /// Download the subtitle's content.
    async fn fetch_content(&mut self, candidate: &SubtitleCandidate) -> Result<Vec<u8>, SourceError>;

    /// Release the session. Called once, whether the command succeeded or not.
    async fn close(self: Box<Self>);
}
