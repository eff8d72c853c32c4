//! Mock identifier and hasher for testing.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::video::{
    ContentHasher, ContentHashes, HashError, Identity, MediaIdentifier, SceneNameIdentifier,
};

/// Mock implementation of the MediaIdentifier trait.
///
/// Names without a configured identity are parsed with [`SceneNameIdentifier`].
#[derive(Debug, Default)]
pub struct MockIdentifier {
    identities: Mutex<HashMap<String, Identity>>,
    panicking: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockIdentifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identify `name` as `identity`.
    pub fn set_identity(&self, name: &str, identity: Identity) {
        if let Ok(mut identities) = self.identities.lock() {
            identities.insert(name.to_string(), identity);
        }
    }

    /// Make identifying `name` panic.
    pub fn panic_on(&self, name: &str) {
        if let Ok(mut panicking) = self.panicking.lock() {
            panicking.insert(name.to_string());
        }
    }

    /// Names identified so far.
    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl MediaIdentifier for MockIdentifier {
    fn identify(&self, name: &str) -> Identity {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(name.to_string());
        }
        let panics = self
            .panicking
            .lock()
            .map(|p| p.contains(name))
            .unwrap_or(false);
        if panics {
            panic!("mock identifier panicked on {}", name);
        }

        self.identities
            .lock()
            .ok()
            .and_then(|identities| identities.get(name).cloned())
            .unwrap_or_else(|| SceneNameIdentifier::new().identify(name))
    }
}

/// Mock implementation of the ContentHasher trait.
///
/// Paths without configured hashes hash to an empty result of size 0.
#[derive(Debug, Default)]
pub struct MockHasher {
    hashes: Mutex<HashMap<PathBuf, ContentHashes>>,
    failing: Mutex<HashSet<PathBuf>>,
}

impl MockHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_hashes(&self, path: impl AsRef<Path>, hashes: ContentHashes) {
        if let Ok(mut map) = self.hashes.lock() {
            map.insert(path.as_ref().to_path_buf(), hashes);
        }
    }

    /// Make hashing `path` fail as if the file were missing.
    pub fn fail_for(&self, path: impl AsRef<Path>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(path.as_ref().to_path_buf());
        }
    }
}

impl ContentHasher for MockHasher {
    fn hash(&self, path: &Path) -> Result<ContentHashes, HashError> {
        let fails = self
            .failing
            .lock()
            .map(|f| f.contains(path))
            .unwrap_or(false);
        if fails {
            return Err(HashError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock failure"),
            });
        }

        Ok(self
            .hashes
            .lock()
            .ok()
            .and_then(|map| map.get(path).cloned())
            .unwrap_or_default())
    }
}
