use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

/// Digest of a byte buffer used as the cache key.
///
/// Only ever compared for equality. Two buffers with the same digest are
/// treated as the same asset, whatever paths they were read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Fingerprint of `bytes`: the lowercase hex MD5 digest
    pub fn of(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Md5::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of fingerprints that need no further compression attempt.
///
/// Insertion order is kept only so the persisted list is stable between
/// flushes; membership is the only thing callers rely on. The set never
/// shrinks.
#[derive(Debug, Default, Clone)]
pub struct ContentCache {
    order: Vec<ContentFingerprint>,
    members: HashSet<ContentFingerprint>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the settled set from a JSON array of fingerprint strings
    ///
    /// # Arguments
    /// * `path` - Cache file, usually `tinypngMd5Record.json`
    ///
    /// # Returns
    /// * The loaded cache. A missing, unreadable or malformed file yields an
    ///   empty one; a broken cache only costs extra remote calls
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                if path.exists() {
                    crate::warn!("Could not read cache file {:?}: {}. Starting empty", path, e);
                }
                return Self::new();
            }
        };

        if content.trim().is_empty() {
            return Self::new();
        }

        match serde_json::from_str::<Vec<ContentFingerprint>>(&content) {
            Ok(entries) => {
                let mut cache = Self::new();
                for fingerprint in entries {
                    cache.mark_settled(fingerprint);
                }
                crate::verbose!("Loaded {} cached fingerprints from {:?}", cache.len(), path);
                cache
            }
            Err(e) => {
                crate::warn!("Cache file {:?} is corrupt ({}). Starting empty", path, e);
                Self::new()
            }
        }
    }

    pub fn is_settled(&self, fingerprint: &ContentFingerprint) -> bool {
        self.members.contains(fingerprint)
    }

    /// Inserts a fingerprint. Returns `false` if it was already settled.
    pub fn mark_settled(&mut self, fingerprint: ContentFingerprint) -> bool {
        if self.members.contains(&fingerprint) {
            return false;
        }
        self.members.insert(fingerprint.clone());
        self.order.push(fingerprint);
        true
    }

    pub fn snapshot(&self) -> &[ContentFingerprint] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
