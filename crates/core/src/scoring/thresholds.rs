//! Kind-to-threshold policy.

use serde::{Deserialize, Serialize};

use crate::video::VideoKind;

/// One score threshold per video kind.
///
/// Generic videos share the movie threshold when gating downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreThresholds {
    pub movie: u32,
    pub episode: u32,
}

impl ScoreThresholds {
    pub fn new(movie: u32, episode: u32) -> Self {
        Self { movie, episode }
    }

    pub fn for_kind(&self, kind: VideoKind) -> u32 {
        match kind {
            VideoKind::Movie | VideoKind::Generic => self.movie,
            VideoKind::Episode => self.episode,
        }
    }

    /// Score at which a video of `kind` needs nothing better.
    ///
    /// Generic videos are never satisfied and stay in every recheck window.
    pub fn satisfied_at(&self, kind: VideoKind) -> Option<u32> {
        match kind {
            VideoKind::Movie => Some(self.movie),
            VideoKind::Episode => Some(self.episode),
            VideoKind::Generic => None,
        }
    }
}

/// Decides whether a selected candidate's score is good enough to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptanceRule {
    /// Initial add: score must reach the kind-specific minimum.
    AtLeast(u32),
    /// Recheck: score must beat what is already on record.
    Exceeds(u32),
}

impl AcceptanceRule {
    pub fn accepts(&self, score: u32) -> bool {
        match *self {
            AcceptanceRule::AtLeast(minimum) => score >= minimum,
            AcceptanceRule::Exceeds(current) => score > current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_by_kind() {
        let thresholds = ScoreThresholds::new(40, 120);
        assert_eq!(thresholds.for_kind(VideoKind::Movie), 40);
        assert_eq!(thresholds.for_kind(VideoKind::Episode), 120);
        assert_eq!(thresholds.for_kind(VideoKind::Generic), 40);
    }

    #[test]
    fn test_generic_is_never_satisfied() {
        let thresholds = ScoreThresholds::new(40, 120);
        assert_eq!(thresholds.satisfied_at(VideoKind::Movie), Some(40));
        assert_eq!(thresholds.satisfied_at(VideoKind::Episode), Some(120));
        assert_eq!(thresholds.satisfied_at(VideoKind::Generic), None);
    }

    #[test]
    fn test_at_least_accepts_equal_score() {
        let rule = AcceptanceRule::AtLeast(20);
        assert!(!rule.accepts(19));
        assert!(rule.accepts(20));
        assert!(rule.accepts(45));
    }

    #[test]
    fn test_exceeds_rejects_equal_score() {
        let rule = AcceptanceRule::Exceeds(80);
        assert!(!rule.accepts(80));
        assert!(rule.accepts(81));
    }

    #[test]
    fn test_exceeds_zero_accepts_any_positive_score() {
        let rule = AcceptanceRule::Exceeds(0);
        assert!(!rule.accepts(0));
        assert!(rule.accepts(1));
    }
}
