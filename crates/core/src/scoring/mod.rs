//! Subtitle scoring: pure decision logic, no I/O.

mod engine;
mod thresholds;
mod types;

pub use engine::{matched_attributes, score_candidate, select_best, Selection};
pub use thresholds::{AcceptanceRule, ScoreThresholds};
pub use types::{MatchAttribute, ScoreWeights};
