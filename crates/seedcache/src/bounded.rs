//! BoundedCache: thread-safe LRU cache with conditional writes

use parking_lot::Mutex;

use crate::lru::LruList;
use crate::stats::CacheStats;

/// Fixed-capacity, string-keyed cache with least-recently-used eviction.
///
/// Every operation runs inside one critical section per cache instance, so
/// concurrent [`test_and_set`](Self::test_and_set) calls on the same key are
/// linearized and exactly one of several conflicting conditional writes wins.
///
/// A capacity of 0 turns the cache into a pass-through: writes report
/// success but nothing is stored.
pub struct BoundedCache<V> {
    /// Recency list, absent in pass-through mode
    entries: Option<Mutex<LruList<String, V>>>,

    /// Cache statistics
    stats: CacheStats,

    /// Maximum number of entries
    capacity: usize,
}

impl<V: Clone> BoundedCache<V> {
    /// Create a cache holding at most `capacity` entries (0 = pass-through)
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: (capacity > 0).then(|| Mutex::new(LruList::new(capacity))),
            stats: CacheStats::new(),
            capacity,
        }
    }

    /// Get the value for `key`, marking it most recently used on a hit
    pub fn get(&self, key: &str) -> Option<V> {
        let found = self
            .entries
            .as_ref()
            .and_then(|entries| entries.lock().get(key).cloned());

        match &found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    /// Store `value` under `key` unconditionally
    pub fn set(&self, key: &str, value: V) {
        let applied = self.test_and_set(key, value, |_| true);
        debug_assert!(applied);
    }

    /// Store `value` under `key` if the key is absent or `test` accepts the
    /// current value.
    ///
    /// `test` is only invoked when the key is present. On success the key
    /// becomes the most recently used entry; when the key is new, oldest
    /// entries are evicted as needed to stay within capacity. Returns whether
    /// the write was applied.
    pub fn test_and_set<F>(&self, key: &str, value: V, test: F) -> bool
    where
        F: FnOnce(&V) -> bool,
    {
        let Some(entries) = &self.entries else {
            return true;
        };

        let mut entries = entries.lock();

        match entries.peek(key).map(test) {
            Some(false) => {
                self.stats.record_rejected();
                return false;
            }
            Some(true) => {
                entries.replace(key, value);
                self.stats.record_replacement();
            }
            None => {
                let evicted = entries.insert(key.to_owned(), value);
                self.stats.record_insert(evicted);
            }
        }
        true
    }

    /// Whether `key` is cached, without touching its recency
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .as_ref()
            .is_some_and(|entries| entries.lock().contains(key))
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get current number of entries
    pub fn len(&self) -> usize {
        self.entries
            .as_ref()
            .map_or(0, |entries| entries.lock().len())
    }

    /// Check if the cache holds nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from least to most recently used
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .as_ref()
            .map_or_else(Vec::new, |entries| entries.lock().keys_oldest_first())
    }
}

impl<V> std::fmt::Debug for BoundedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
