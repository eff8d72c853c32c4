//! Match attributes and weights.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An identity attribute a subtitle candidate can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAttribute {
    Series,
    Season,
    Episode,
    Title,
    Year,
    ReleaseGroup,
    Resolution,
    Format,
    VideoCodec,
    AudioCodec,
    /// Content hash and file size both equal.
    Hash,
}

/// Per-attribute weights supplied by a subtitle source. Missing attributes weigh 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights(BTreeMap<MatchAttribute, u32>);

impl ScoreWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: MatchAttribute, weight: u32) -> Self {
        self.0.insert(attribute, weight);
        self
    }

    pub fn weight(&self, attribute: MatchAttribute) -> u32 {
        self.0.get(&attribute).copied().unwrap_or(0)
    }
}

impl FromIterator<(MatchAttribute, u32)> for ScoreWeights {
    fn from_iter<T: IntoIterator<Item = (MatchAttribute, u32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
