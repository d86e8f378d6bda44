//! Slow-tier storage backends.
//!
//! The slow tier stores serialized envelopes keyed by the canonical cache
//! key. Implementations are synchronous and infallible-on-miss: a missing
//! entry is `Ok(None)`, never an error.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

/// Error from a slow-tier backend.
#[derive(Debug, thiserror::Error)]
pub enum TierError {
    /// The backend is not usable right now.
    #[error("cache tier unavailable: {0}")]
    Unavailable(String),

    /// Filesystem failure underneath a persistent tier.
    #[error("cache tier io: {0}")]
    Io(#[from] io::Error),
}

/// A persistent (or at least process-outliving) cache tier.
///
/// Values are serialized envelope JSON; the tier never inspects them.
pub trait SlowTier: Send + Sync {
    /// Fetch the stored value for `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, TierError>;

    /// Store `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: &str) -> Result<(), TierError>;

    /// Drop the entry for `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), TierError>;
}

/// In-memory slow tier, for tests and ephemeral processes.
#[derive(Debug, Default)]
pub struct MemoryTier {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTier {
    /// Empty tier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SlowTier for MemoryTier {
    fn get(&self, key: &str) -> Result<Option<String>, TierError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TierError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TierError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Filesystem-backed slow tier: one JSON file per key under a directory.
#[derive(Debug)]
pub struct FileTier {
    dir: PathBuf,
}

impl FileTier {
    /// Use `dir` as the storage root, creating it if needed.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, TierError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Keys contain `/` separators and arbitrary name characters, so the
    /// filename percent-encodes every byte outside a safe set. The
    /// encoding is injective: distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut safe = String::with_capacity(key.len());
        for byte in key.bytes() {
            match byte {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' | b'_' => {
                    safe.push(char::from(byte));
                }
                _ => {
                    safe.push('%');
                    safe.push_str(&format!("{byte:02X}"));
                }
            }
        }
        self.dir.join(format!("{safe}.json"))
    }
}

impl SlowTier for FileTier {
    fn get(&self, key: &str) -> Result<Option<String>, TierError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TierError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TierError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
