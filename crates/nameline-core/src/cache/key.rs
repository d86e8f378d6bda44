//! Canonical cache keys.

/// Build the canonical cache key for a namespaced, versioned lookup.
///
/// The subject name is normalized (trimmed, lowercased) so that lookups
/// differing only in case or surrounding whitespace share one entry. The
/// schema version is part of the key, so bumping it orphans stale entries
/// instead of deserializing them into a newer shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// `{namespace}/v{version}/{normalized-name}`.
    #[must_use]
    pub fn new(namespace: &str, name: &str, version: u32) -> Self {
        let normalized = name.trim().to_lowercase();
        Self(format!("{namespace}/v{version}/{normalized}"))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
