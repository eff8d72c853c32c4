//! Several subtitle providers behind one source.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{SourceError, SubtitleCandidate, SubtitleSession, SubtitleSource};
use crate::scoring::ScoreWeights;
use crate::video::{Identity, VideoKind};

/// Queries every configured provider and merges their candidates.
///
/// Candidates keep the order of the providers, so a tie between providers
/// goes to the one configured first. A provider that cannot be reached is
/// left out of the command rather than failing it.
pub struct ProviderPool {
    sources: Vec<Arc<dyn SubtitleSource>>,
}

impl ProviderPool {
    pub fn new(sources: Vec<Arc<dyn SubtitleSource>>) -> Self {
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl SubtitleSource for ProviderPool {
    fn name(&self) -> &str {
        "pool"
    }

    fn score_weights(&self, provider: &str, kind: VideoKind) -> Option<ScoreWeights> {
        self.sources
            .iter()
            .find_map(|source| source.score_weights(provider, kind))
    }

    async fn open_session(&self) -> Result<Box<dyn SubtitleSession>, SourceError> {
        let mut members = Vec::with_capacity(self.sources.len());
        let mut last_error = None;

        for source in &self.sources {
            match source.open_session().await {
                Ok(session) => members.push(Member {
                    provider: source.name().to_string(),
                    session,
                }),
                Err(e) => {
                    warn!(provider = source.name(), error = %e, "Provider unavailable for this command");
                    last_error = Some(e);
                }
            }
        }

        if members.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| SourceError::ConnectionFailed("no providers configured".to_string())));
        }

        Ok(Box::new(PoolSession { members }))
    }
}

struct Member {
    provider: String,
    session: Box<dyn SubtitleSession>,
}

struct PoolSession {
    members: Vec<Member>,
}

#[async_trait]
impl SubtitleSession for PoolSession {
    /// Fails only if every provider fails.
    async fn list_candidates(
        &mut self,
        identity: &Identity,
        languages: &[String],
    ) -> Result<Vec<SubtitleCandidate>, SourceError> {
        let mut candidates = Vec::new();
        let mut first_error = None;
        let mut answered = 0;

        for member in &mut self.members {
            match member.session.list_candidates(identity, languages).await {
                Ok(found) => {
                    debug!(provider = %member.provider, count = found.len(), "Provider listed candidates");
                    candidates.extend(found);
                    answered += 1;
                }
                Err(e) => {
                    warn!(provider = %member.provider, error = %e, "Provider listing failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if answered == 0 => Err(e),
            _ => Ok(candidates),
        }
    }

    async fn fetch_content(&mut self, candidate: &SubtitleCandidate) -> Result<Vec<u8>, SourceError> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.provider == candidate.provider)
            .ok_or_else(|| {
                SourceError::NotFound(format!(
                    "{} (provider {} not in session)",
                    candidate.subtitle_id, candidate.provider
                ))
            })?;
        member.session.fetch_content(candidate).await
    }

    async fn close(self: Box<Self>) {
        for member in self.members {
            member.session.close().await;
        }
    }
}
