//! # TTL Cache
//!
//! Bounded in-process cache with explicit expiry, used for short-lived
//! per-session state such as the coupon codes a customer already applied.
//!
//! The cache never reads the clock: every call takes `now`, so expiry is
//! deterministic in tests and the owner decides where the cache lives (one
//! per server, behind whatever lock it needs).
//!
//! ## Eviction
//! ```text
//! insert(key, value, now)
//!     │
//!     ├── drop every entry with expires_at <= now
//!     │
//!     ├── key already present?  → replace, refresh expiry
//!     │
//!     └── at capacity?          → evict the entry inserted longest ago
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// Cache construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache capacity must be at least 1")]
    ZeroCapacity,

    #[error("cache TTL must be positive, got {0} seconds")]
    NonPositiveTtl(i64),
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A capacity-bounded map whose entries expire `ttl` after insertion.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use storefront_core::cache::TtlCache;
    ///
    /// let mut cache = TtlCache::new(Duration::minutes(30), 1000).unwrap();
    /// let now = Utc::now();
    /// cache.insert("user-1", vec!["SAVE10".to_string()], now);
    ///
    /// assert!(cache.get(&"user-1", now).is_some());
    /// assert!(cache.get(&"user-1", now + Duration::minutes(31)).is_none());
    /// ```
    pub fn new(ttl: Duration, capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        if ttl <= Duration::zero() {
            return Err(CacheError::NonPositiveTtl(ttl.num_seconds()));
        }

        Ok(TtlCache {
            ttl,
            capacity,
            entries: HashMap::new(),
        })
    }

    /// Live value for `key`, if any.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| &entry.value)
    }

    /// Stores `value`, replacing any previous value for `key` and restarting
    /// its TTL.
    pub fn insert(&mut self, key: K, value: V, now: DateTime<Utc>) {
        self.purge_expired(now);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Drops expired entries and returns how many were removed.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Number of stored entries, including any not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> TtlCache<String, u32> {
        TtlCache::new(Duration::seconds(60), capacity).unwrap()
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert_eq!(
            TtlCache::<String, u32>::new(Duration::seconds(60), 0).unwrap_err(),
            CacheError::ZeroCapacity
        );
        assert!(matches!(
            TtlCache::<String, u32>::new(Duration::zero(), 10),
            Err(CacheError::NonPositiveTtl(0))
        ));
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let mut cache = cache(10);
        let t0 = Utc::now();
        cache.insert("a".to_string(), 1, t0);

        assert_eq!(cache.get(&"a".to_string(), t0 + Duration::seconds(59)), Some(&1));
        assert_eq!(cache.get(&"a".to_string(), t0 + Duration::seconds(60)), None);
    }

    #[test]
    fn test_reinsert_refreshes_ttl() {
        let mut cache = cache(10);
        let t0 = Utc::now();
        cache.insert("a".to_string(), 1, t0);
        cache.insert("a".to_string(), 2, t0 + Duration::seconds(50));

        assert_eq!(cache.get(&"a".to_string(), t0 + Duration::seconds(100)), Some(&2));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = cache(2);
        let t0 = Utc::now();
        cache.insert("a".to_string(), 1, t0);
        cache.insert("b".to_string(), 2, t0 + Duration::seconds(1));
        cache.insert("c".to_string(), 3, t0 + Duration::seconds(2));

        let now = t0 + Duration::seconds(3);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&"a".to_string(), now).is_none());
        assert_eq!(cache.get(&"c".to_string(), now), Some(&3));
    }

    #[test]
    fn test_expired_entries_free_capacity_first() {
        let mut cache = cache(2);
        let t0 = Utc::now();
        cache.insert("a".to_string(), 1, t0);
        cache.insert("b".to_string(), 2, t0 + Duration::seconds(30));

        // "a" has expired, so "b" survives the insert
        cache.insert("c".to_string(), 3, t0 + Duration::seconds(61));
        let now = t0 + Duration::seconds(62);
        assert_eq!(cache.get(&"b".to_string(), now), Some(&2));
        assert_eq!(cache.get(&"c".to_string(), now), Some(&3));
    }

    #[test]
    fn test_remove_and_purge() {
        let mut cache = cache(10);
        let t0 = Utc::now();
        cache.insert("a".to_string(), 1, t0);
        cache.insert("b".to_string(), 2, t0);

        assert_eq!(cache.remove(&"a".to_string()), Some(1));
        assert_eq!(cache.purge_expired(t0 + Duration::hours(1)), 1);
        assert!(cache.is_empty());
    }
}
