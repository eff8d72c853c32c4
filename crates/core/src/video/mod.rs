//! Video identity: the model, display-name identification and content hashing.

mod hasher;
mod identifier;
mod types;

pub use hasher::{ContentHasher, FileHasher, HashError, NAPIPROJEKT_HASH, OPENSUBTITLES_HASH, THESUBDB_HASH};
pub use identifier::{parse_release, MediaIdentifier, SceneNameIdentifier};
pub use types::*;
