//! Time-bounded cache for computed statistics.
//!
//! The cache is an explicit value owned by whoever needs it (usually a
//! [`crate::analytics::SummaryService`]); expiry is checked when an entry is
//! read, so there is no background sweeper.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// String-keyed cache whose entries expire `ttl` after being stored.
pub struct StatsCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> StatsCache<V> {
    /// Create an empty cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a clone of the value for `key` if it has not expired.
    ///
    /// Expired entries are removed on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().ok()?;
        let expired = match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
            tracing::trace!(key, "Cache entry expired");
        }
        None
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// Expired entries under other keys are dropped at the same time.
    pub fn set(&self, key: impl Into<String>, value: V) {
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
            entries.insert(
                key.into(),
                CacheEntry {
                    value,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Drop the entry for `key`. Returns true if one was present.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_fresh_value() {
        let cache = StatsCache::new(Duration::from_secs(60));
        cache.set("summary:weekly", 42u32);
        assert_eq!(cache.get("summary:weekly"), Some(42));
        assert_eq!(cache.get("summary:daily"), None);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = StatsCache::new(Duration::ZERO);
        cache.set("k", 1u32);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = StatsCache::new(Duration::from_secs(60));
        cache.set("a", 1u32);
        cache.set("b", 2u32);

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_sweeps_expired_entries() {
        let cache = StatsCache::new(Duration::ZERO);
        cache.set("summary:weekly:2024-03-03", 1u32);
        cache.set("summary:weekly:2024-03-10", 2u32);
        cache.set("summary:weekly:2024-03-17", 3u32);
        assert_eq!(cache.len(), 1);

        let cache = StatsCache::new(Duration::from_secs(60));
        cache.set("a", 1u32);
        cache.set("b", 2u32);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_set_replaces_value() {
        let cache = StatsCache::new(Duration::from_secs(60));
        cache.set("k", 1u32);
        cache.set("k", 2u32);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
