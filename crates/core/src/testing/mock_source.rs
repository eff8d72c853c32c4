//! Mock subtitle source for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::scoring::ScoreWeights;
use crate::source::{SourceError, SubtitleCandidate, SubtitleSession, SubtitleSource};
use crate::video::{Identity, VideoKind};

/// A recorded candidate listing for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedListing {
    /// Name of the identity that was searched.
    pub identity: String,
    pub languages: Vec<String>,
}

#[derive(Default)]
struct MockSourceState {
    /// Candidates and the content each one downloads as.
    candidates: RwLock<Vec<(SubtitleCandidate, Vec<u8>)>>,
    /// Languages whose listing fails.
    failing_languages: RwLock<HashSet<String>>,
    /// Subtitle ids whose download fails.
    failing_fetches: RwLock<HashSet<String>>,
    /// If set, opening a session fails with this message.
    open_error: RwLock<Option<String>>,
    /// Simulated latency of each fetch.
    fetch_delay: RwLock<Duration>,
    listings: RwLock<Vec<RecordedListing>>,
    fetches: RwLock<Vec<String>>,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
}

/// Mock implementation of the SubtitleSource trait.
///
/// Provides controllable behavior for testing:
/// - Serve configured candidates and their content
/// - Fail listings per language or fetches per subtitle id
/// - Track sessions, listings and fetches for assertions
///
/// # Example
///
/// ```rust,ignore
/// use subrecall_core::testing::{MockSubtitleSource, fixtures};
///
/// let source = MockSubtitleSource::new(fixtures::weights());
/// source.add_candidate(fixtures::movie_candidate("1", "en", "Movie", None), b"1\n...").await;
///
/// // ... run commands ...
///
/// assert_eq!(source.fetched().await, vec!["1"]);
/// ```
#[derive(Clone)]
pub struct MockSubtitleSource {
    name: String,
    weights: ScoreWeights,
    state: Arc<MockSourceState>,
}

impl std::fmt::Debug for MockSubtitleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSubtitleSource")
            .field("name", &self.name)
            .field("weights", &self.weights)
            .field("state", &"<state>")
            .finish()
    }
}

impl MockSubtitleSource {
    /// Create a mock provider named "mock", using the same weights for every kind.
    pub fn new(weights: ScoreWeights) -> Self {
        Self::named("mock", weights)
    }

    /// Create a mock provider with its own name, for pooling several mocks.
    ///
    /// Candidates added to it should carry `name` as their provider.
    pub fn named(name: &str, weights: ScoreWeights) -> Self {
        Self {
            name: name.to_string(),
            weights,
            state: Arc::new(MockSourceState::default()),
        }
    }

    /// Add a candidate that downloads as `content`.
    pub async fn add_candidate(&self, candidate: SubtitleCandidate, content: impl Into<Vec<u8>>) {
        self.state
            .candidates
            .write()
            .await
            .push((candidate, content.into()));
    }

    /// Remove all candidates.
    pub async fn clear_candidates(&self) {
        self.state.candidates.write().await.clear();
    }

    /// Make listings for `language` fail.
    pub async fn fail_listing(&self, language: &str) {
        self.state
            .failing_languages
            .write()
            .await
            .insert(language.to_string());
    }

    /// Make downloads of `subtitle_id` fail.
    pub async fn fail_fetch(&self, subtitle_id: &str) {
        self.state
            .failing_fetches
            .write()
            .await
            .insert(subtitle_id.to_string());
    }

    /// Make the next session opens fail.
    pub async fn fail_open(&self, message: &str) {
        *self.state.open_error.write().await = Some(message.to_string());
    }

    /// Delay every fetch by `delay`.
    pub async fn set_fetch_delay(&self, delay: Duration) {
        *self.state.fetch_delay.write().await = delay;
    }

    /// Subtitle ids fetched so far, in order.
    pub async fn fetched(&self) -> Vec<String> {
        self.state.fetches.read().await.clone()
    }

    /// Listings requested so far, in order.
    pub async fn recorded_listings(&self) -> Vec<RecordedListing> {
        self.state.listings.read().await.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.sessions_closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubtitleSource for MockSubtitleSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn score_weights(&self, provider: &str, _kind: VideoKind) -> Option<ScoreWeights> {
        (provider == self.name).then(|| self.weights.clone())
    }

    async fn open_session(&self) -> Result<Box<dyn SubtitleSession>, SourceError> {
        if let Some(message) = self.state.open_error.read().await.clone() {
            return Err(SourceError::ConnectionFailed(message));
        }
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    state: Arc<MockSourceState>,
}

#[async_trait]
impl SubtitleSession for MockSession {
    async fn list_candidates(
        &mut self,
        identity: &Identity,
        languages: &[String],
    ) -> Result<Vec<SubtitleCandidate>, SourceError> {
        self.state.listings.write().await.push(RecordedListing {
            identity: identity.name.clone(),
            languages: languages.to_vec(),
        });

        let failing = self.state.failing_languages.read().await;
        if let Some(language) = languages.iter().find(|l| failing.contains(*l)) {
            return Err(SourceError::ApiError {
                status: 503,
                message: format!("listing {} failed", language),
            });
        }

        Ok(self
            .state
            .candidates
            .read()
            .await
            .iter()
            .filter(|(c, _)| languages.contains(&c.language))
            .map(|(c, _)| c.clone())
            .collect())
    }

    async fn fetch_content(&mut self, candidate: &SubtitleCandidate) -> Result<Vec<u8>, SourceError> {
        let delay = *self.state.fetch_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.state
            .fetches
            .write()
            .await
            .push(candidate.subtitle_id.clone());

        if self
            .state
            .failing_fetches
            .read()
            .await
            .contains(&candidate.subtitle_id)
        {
            return Err(SourceError::NotFound(candidate.subtitle_id.clone()));
        }

        self.state
            .candidates
            .read()
            .await
            .iter()
            .find(|(c, _)| c.provider == candidate.provider && c.subtitle_id == candidate.subtitle_id)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| SourceError::NotFound(candidate.subtitle_id.clone()))
    }

    async fn close(self: Box<Self>) {
        self.state.sessions_closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_lists_requested_languages_only() {
        let source = MockSubtitleSource::new(fixtures::weights());
        source
            .add_candidate(fixtures::movie_candidate("1", "en", "Movie", None), "en")
            .await;
        source
            .add_candidate(fixtures::movie_candidate("2", "fr", "Movie", None), "fr")
            .await;

        let mut session = source.open_session().await.unwrap();
        let identity = fixtures::movie_identity("Movie", Some(2016));
        let found = session
            .list_candidates(&identity, &["en".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(session.fetch_content(&found[0]).await.unwrap(), b"en");

        session.close().await;
        assert_eq!(source.sessions_opened(), 1);
        assert_eq!(source.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn test_failures() {
        let source = MockSubtitleSource::new(fixtures::weights());
        let candidate = fixtures::movie_candidate("1", "en", "Movie", None);
        source.add_candidate(candidate.clone(), "x").await;
        source.fail_listing("pt-BR").await;
        source.fail_fetch("1").await;

        let mut session = source.open_session().await.unwrap();
        let identity = fixtures::movie_identity("Movie", None);
        assert!(session
            .list_candidates(&identity, &["pt-BR".to_string()])
            .await
            .is_err());
        assert!(session.fetch_content(&candidate).await.is_err());

        source.fail_open("down").await;
        assert!(source.open_session().await.is_err());
    }
}
