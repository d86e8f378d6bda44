//! Registry detail lookups, with a cached decorator.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, LookupCache};

/// Bump when [`NameDetail`]'s shape changes; stale cache entries under the
/// old version then read as misses instead of deserializing wrong.
pub const DETAIL_SCHEMA_VERSION: u32 = 2;

/// Registry-side detail record for a name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameDetail {
    /// Current owner address.
    pub owner: Option<String>,
    /// Controller addresses.
    pub controllers: Vec<String>,
    /// Lease end, seconds since epoch.
    pub expiry_ts: Option<i64>,
    /// Managing process id.
    pub process_id: Option<String>,
    /// Undername allowance.
    pub undername_limit: Option<u64>,
}

/// Error from a detail or content lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// The name is not registered.
    #[error("name not found: {0}")]
    NotFound(String),

    /// The backing service failed.
    #[error("lookup backend: {0}")]
    Backend(String),
}

/// Fetches the registry detail record for a name.
#[async_trait]
pub trait DetailClient: Send + Sync {
    /// Fetch the detail record for `name`.
    async fn fetch(&self, name: &str) -> Result<NameDetail, LookupError>;
}

/// Caching decorator over any [`DetailClient`].
///
/// Hits come from the cache within `ttl`; misses hit the inner client and
/// write back. Inner-client errors are never cached.
pub struct CachedDetailClient<C> {
    inner: C,
    cache: Arc<LookupCache>,
    ttl: Duration,
}

impl<C: DetailClient> CachedDetailClient<C> {
    /// Wrap `inner`, serving repeats from `cache` for `ttl`.
    #[must_use]
    pub fn new(inner: C, cache: Arc<LookupCache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl<C: DetailClient> DetailClient for CachedDetailClient<C> {
    async fn fetch(&self, name: &str) -> Result<NameDetail, LookupError> {
        let key = CacheKey::new("detail", name, DETAIL_SCHEMA_VERSION);
        if let Some(cached) = self.cache.get::<NameDetail>(&key, self.ttl) {
            tracing::debug!(name, "detail served from cache");
            return Ok(cached);
        }

        let detail = self.inner.fetch(name).await?;
        self.cache.set(&key, &detail);
        Ok(detail)
    }
}
