//! Two-tier TTL lookup cache.
//!
//! Reads check the in-process fast tier first, then fall back to the slow
//! tier and warm the fast tier on a hit. Every stored value carries its
//! storage timestamp; freshness is judged at read time against a
//! caller-supplied TTL, so the same entry can be fresh for one caller and
//! expired for another. Expired entries are treated as absent and left in
//! place; they are replaced by the next write, never reaped.
//!
//! Slow-tier failures degrade the cache, they never fail the caller: reads
//! fall through to a miss, writes log and continue.

pub mod key;
pub mod tier;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use key::CacheKey;
pub use tier::{FileTier, MemoryTier, SlowTier, TierError};

/// Millisecond clock, injected so tests control time.
pub trait Clock: Send + Sync {
    /// Current time, milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A cached value with its storage timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    stored_at_ms: i64,
    value: serde_json::Value,
}

impl Envelope {
    fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.stored_at_ms) <= ttl_ms
    }
}

/// Two-tier cache: in-process map in front of a [`SlowTier`].
pub struct LookupCache {
    fast: Mutex<HashMap<String, Envelope>>,
    slow: Box<dyn SlowTier>,
    clock: Box<dyn Clock>,
}

impl LookupCache {
    /// Cache over `slow`, using the wall clock.
    #[must_use]
    pub fn new(slow: Box<dyn SlowTier>) -> Self {
        Self::with_clock(slow, Box::new(SystemClock))
    }

    /// Cache over `slow` with an injected clock.
    #[must_use]
    pub fn with_clock(slow: Box<dyn SlowTier>, clock: Box<dyn Clock>) -> Self {
        Self {
            fast: Mutex::new(HashMap::new()),
            slow,
            clock,
        }
    }

    fn fast(&self) -> std::sync::MutexGuard<'_, HashMap<String, Envelope>> {
        self.fast.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, honoring `ttl` against the entry's storage time.
    ///
    /// Fast-tier fresh hit returns immediately. Otherwise the slow tier is
    /// consulted; a fresh slow-tier hit warms the fast tier. Expired
    /// entries in either tier read as `None` and stay where they are.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey, ttl: Duration) -> Option<T> {
        let now = self.clock.now_ms();

        if let Some(envelope) = self.fast().get(key.as_str()) {
            if envelope.is_fresh(now, ttl) {
                return decode(key, &envelope.value);
            }
        }

        let raw = match self.slow.get(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "slow tier read failed");
                return None;
            }
        };

        let envelope: Envelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "corrupt cache envelope");
                return None;
            }
        };
        if !envelope.is_fresh(now, ttl) {
            return None;
        }

        let value = decode(key, &envelope.value);
        self.fast().insert(key.as_str().to_string(), envelope);
        value
    }

    /// Store `value` under `key` in both tiers, stamped with the current
    /// time. A slow-tier failure is logged and swallowed.
    pub fn set<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "unserializable cache value");
                return;
            }
        };
        let envelope = Envelope {
            stored_at_ms: self.clock.now_ms(),
            value,
        };

        if let Ok(raw) = serde_json::to_string(&envelope) {
            if let Err(err) = self.slow.set(key.as_str(), &raw) {
                tracing::warn!(key = %key, error = %err, "slow tier write failed");
            }
        }
        self.fast().insert(key.as_str().to_string(), envelope);
    }

    /// Drop `key` from both tiers.
    pub fn remove(&self, key: &CacheKey) {
        self.fast().remove(key.as_str());
        if let Err(err) = self.slow.remove(key.as_str()) {
            tracing::warn!(key = %key, error = %err, "slow tier remove failed");
        }
    }
}

fn decode<T: DeserializeOwned>(key: &CacheKey, value: &serde_json::Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "cache value shape mismatch");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct FakeClock(AtomicI64);

    impl FakeClock {
        fn advance(&self, ms: i64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for Arc<FakeClock> {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    /// Slow tier that fails every operation.
    struct BrokenTier;

    impl SlowTier for BrokenTier {
        fn get(&self, _key: &str) -> Result<Option<String>, TierError> {
            Err(TierError::Unavailable("down".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), TierError> {
            Err(TierError::Unavailable("down".to_string()))
        }
        fn remove(&self, _key: &str) -> Result<(), TierError> {
            Err(TierError::Unavailable("down".to_string()))
        }
    }

    fn cache_with_clock() -> (LookupCache, Arc<FakeClock>) {
        let clock = Arc::new(FakeClock::default());
        let cache =
            LookupCache::with_clock(Box::new(MemoryTier::new()), Box::new(Arc::clone(&clock)));
        (cache, clock)
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::new("detail", name, 1)
    }

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn set_then_get_within_ttl() {
        let (cache, _clock) = cache_with_clock();
        cache.set(&key("example"), &"value".to_string());
        assert_eq!(
            cache.get::<String>(&key("example"), TTL).as_deref(),
            Some("value")
        );
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let (cache, clock) = cache_with_clock();
        cache.set(&key("example"), &"value".to_string());
        clock.advance(61_000);
        assert!(cache.get::<String>(&key("example"), TTL).is_none());
    }

    #[test]
    fn ttl_is_judged_at_read_time_per_caller() {
        let (cache, clock) = cache_with_clock();
        cache.set(&key("example"), &"value".to_string());
        clock.advance(30_000);
        // Same entry: fresh for a 60s TTL, expired for a 10s TTL.
        assert!(cache.get::<String>(&key("example"), TTL).is_some());
        assert!(cache
            .get::<String>(&key("example"), Duration::from_secs(10))
            .is_none());
    }

    #[test]
    fn expired_entry_is_left_in_place_not_reaped() {
        let (cache, clock) = cache_with_clock();
        cache.set(&key("example"), &"value".to_string());
        clock.advance(61_000);
        assert!(cache.get::<String>(&key("example"), TTL).is_none());
        // The raw entry still exists in the slow tier.
        assert!(cache.slow.get(key("example").as_str()).unwrap().is_some());
    }

    #[test]
    fn slow_tier_hit_warms_fast_tier() {
        let clock = Arc::new(FakeClock::default());
        let slow = MemoryTier::new();
        let envelope = serde_json::json!({ "stored_at_ms": 0, "value": "warm" });
        slow.set(key("example").as_str(), &envelope.to_string())
            .unwrap();

        let cache = LookupCache::with_clock(Box::new(slow), Box::new(Arc::clone(&clock)));
        assert!(cache.fast().is_empty());
        assert_eq!(
            cache.get::<String>(&key("example"), TTL).as_deref(),
            Some("warm")
        );
        assert!(cache.fast().contains_key(key("example").as_str()));
    }

    #[test]
    fn broken_slow_tier_degrades_silently() {
        let clock = Arc::new(FakeClock::default());
        let cache = LookupCache::with_clock(Box::new(BrokenTier), Box::new(clock));
        // Writes still land in the fast tier.
        cache.set(&key("example"), &"value".to_string());
        assert_eq!(
            cache.get::<String>(&key("example"), TTL).as_deref(),
            Some("value")
        );
        // A fast-tier miss plus a broken slow tier is just a miss.
        assert!(cache.get::<String>(&key("other"), TTL).is_none());
        cache.remove(&key("example"));
        assert!(cache.get::<String>(&key("example"), TTL).is_none());
    }

    #[test]
    fn corrupt_envelope_reads_as_miss() {
        let clock = Arc::new(FakeClock::default());
        let slow = MemoryTier::new();
        slow.set(key("example").as_str(), "not json").unwrap();
        let cache = LookupCache::with_clock(Box::new(slow), Box::new(clock));
        assert!(cache.get::<String>(&key("example"), TTL).is_none());
    }

    #[test]
    fn remove_clears_both_tiers() {
        let (cache, _clock) = cache_with_clock();
        cache.set(&key("example"), &"value".to_string());
        cache.remove(&key("example"));
        assert!(cache.get::<String>(&key("example"), TTL).is_none());
        assert!(cache.slow.get(key("example").as_str()).unwrap().is_none());
    }

    #[test]
    fn overwrite_refreshes_timestamp() {
        let (cache, clock) = cache_with_clock();
        cache.set(&key("example"), &"old".to_string());
        clock.advance(59_000);
        cache.set(&key("example"), &"new".to_string());
        clock.advance(59_000);
        // Old stamp would be expired; the rewrite reset it.
        assert_eq!(
            cache.get::<String>(&key("example"), TTL).as_deref(),
            Some("new")
        );
    }
}
