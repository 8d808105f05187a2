//! # Recommendation Cache
//!
//! A shared, type-erased cache of fetched recommendation batches, keyed by
//! request fingerprint. It supports:
//! - **Expiration**: every entry carries its own `expires_at`; expired entries are
//!   treated as absent and removed on access or by [`RecommendationCache::cleanup_expired`].
//! - **Bounded size**: when a store pushes the cache over its bound, the oldest
//!   entries (by store time) are evicted first.
//! - **Stats**: hit/miss counters and entry ages for introspection.
//!
//! Cache operations never fail. A poisoned lock or a type mismatch reads as a miss.
//!
//! ## Example
//! ```rust
//! use storefront_recommendations::cache::RecommendationCache;
//! use std::time::Duration;
//!
//! let cache = RecommendationCache::new();
//! cache.set("acme:similar:all:00".to_string(), vec![1, 2, 3], Duration::from_secs(60));
//! let value: Option<Vec<i32>> = cache.get("acme:similar:all:00", Duration::from_secs(60));
//! assert_eq!(value, Some(vec![1, 2, 3]));
//! ```

use std::{
    any::Any,
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use crate::platform::{DEFAULT_MAX_CACHE_SIZE, Instant};

/// A type-erased cache entry with its store time and expiry
///
/// `expires_at` is `None` when `cached_at + ttl` is past what `Instant` can
/// represent; such an entry never expires on its own.
#[derive(Clone)]
pub struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    cached_at: Instant,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    /// Creates a new cache entry that expires `ttl` from now.
    pub fn new<T: Clone + Send + Sync + 'static>(data: T, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data: Arc::new(data),
            cached_at: now,
            expires_at: now.checked_add(ttl),
        }
    }

    /// Retrieves the cached data of type `T`, or `None` on a type mismatch.
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.data.downcast_ref::<T>().cloned()
    }

    /// An entry is valid only while `now < expires_at`.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }

    /// True once the entry is older than `ttl`, regardless of its own expiry.
    pub fn is_older_than(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() >= ttl
    }

    /// Gets the age of this cache entry.
    pub fn age(&self) -> Duration {
        self.cached_at.elapsed()
    }

    pub fn cached_at(&self) -> Instant {
        self.cached_at
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }
}

/// Shared cache for fetched recommendation batches
#[derive(Clone)]
pub struct RecommendationCache {
    cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
    max_entries: usize,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for RecommendationCache {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_CACHE_SIZE)
    }
}

impl RecommendationCache {
    /// Creates a cache bounded to the default number of entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache that holds at most `max_entries` batches (at least one).
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
            max_entries: max_entries.max(1),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Retrieves a cached batch if it is still valid.
    ///
    /// An entry is served only while it is younger than `ttl` and before its own
    /// `expires_at`. Otherwise it is removed and `None` is returned.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str, ttl: Duration) -> Option<T> {
        let Ok(mut cache) = self.cache.lock() else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let expired = match cache.get(key) {
            Some(entry) => entry.is_expired() || entry.is_older_than(ttl),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if expired {
            cache.remove(key);
            crate::debug_log!(
                "🗑️ [CACHE-EXPIRATION] Removing expired cache entry for key: {}",
                key
            );
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let data = cache.get(key).and_then(CacheEntry::get::<T>);
        match data {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                crate::log_cache_hit!("Serving cached batch for key: {}", key);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        data
    }

    /// True if a valid entry exists for `key`. Does not touch the counters.
    pub fn contains(&self, key: &str) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.get(key).is_some_and(|entry| !entry.is_expired()))
            .unwrap_or(false)
    }

    /// Stores a batch that expires `ttl` from now.
    ///
    /// Expired entries are purged first; if the cache is still over its bound the
    /// oldest entries are evicted.
    pub fn set<T: Clone + Send + Sync + 'static>(&self, key: String, value: T, ttl: Duration) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key.clone(), CacheEntry::new(value, ttl));
            crate::log_cache_store!("Stored batch for key: {} (ttl {:?})", key, ttl);

            let expired = Self::retain_unexpired(&mut cache);
            let evicted = Self::evict_oldest(&mut cache, self.max_entries);
            if expired + evicted > 0 {
                crate::debug_log!(
                    "🧹 [CACHE-CLEANUP] Removed {} expired and {} oldest entries",
                    expired,
                    evicted
                );
            }
        }
    }

    /// Removes a cached batch by key.
    pub fn remove(&self, key: &str) -> bool {
        if let Ok(mut cache) = self.cache.lock() {
            cache.remove(key).is_some()
        } else {
            false
        }
    }

    /// Invalidates a cached batch by key (alias for remove).
    pub fn invalidate(&self, key: &str) {
        if self.remove(key) {
            crate::log_cache_invalidate!("Invalidated cache entry for key: {}", key);
        }
    }

    /// Clears all cached batches, for every instance.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            #[cfg(feature = "tracing")]
            let count = cache.len();
            cache.clear();
            #[cfg(feature = "tracing")]
            crate::debug_log!("🗑️ [CACHE-CLEAR] Cleared {} cache entries", count);
        }
    }

    /// Removes every entry whose `expires_at` has passed. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        if let Ok(mut cache) = self.cache.lock() {
            let removed = Self::retain_unexpired(&mut cache);
            if removed > 0 {
                crate::debug_log!("🧹 [CACHE-CLEANUP] Removed {} expired entries", removed);
            }
            removed
        } else {
            0
        }
    }

    /// Evicts the oldest entries until at most `max_size` remain. Returns the number evicted.
    pub fn evict_oldest_entries(&self, max_size: usize) -> usize {
        if let Ok(mut cache) = self.cache.lock() {
            Self::evict_oldest(&mut cache, max_size)
        } else {
            0
        }
    }

    /// Gets the number of cached entries, expired or not.
    pub fn size(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Gets cache statistics.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        if let Ok(cache) = self.cache.lock() {
            let entry_count = cache.len();
            let expired_count = cache.values().filter(|entry| entry.is_expired()).count();
            let total_age: Duration = cache.values().map(CacheEntry::age).sum();
            let avg_age = if entry_count > 0 {
                total_age / entry_count as u32
            } else {
                Duration::ZERO
            };

            CacheStats {
                entry_count,
                expired_count,
                hits,
                misses,
                avg_age,
            }
        } else {
            CacheStats {
                hits,
                misses,
                ..CacheStats::default()
            }
        }
    }

    fn retain_unexpired(cache: &mut HashMap<String, CacheEntry>) -> usize {
        let initial_size = cache.len();
        cache.retain(|_key, entry| {
            let keep = !entry.is_expired();
            #[cfg(feature = "tracing")]
            if !keep {
                crate::debug_log!("🧹 [CACHE-CLEANUP] Removing expired entry: {}", _key);
            }
            keep
        });
        initial_size - cache.len()
    }

    fn evict_oldest(cache: &mut HashMap<String, CacheEntry>, max_size: usize) -> usize {
        if cache.len() <= max_size {
            return 0;
        }

        let mut entries: Vec<_> = cache.drain().collect();
        // Newest first, so the tail is what gets evicted
        entries.sort_by(|(_, a), (_, b)| b.cached_at.cmp(&a.cached_at));
        let evicted = entries.split_off(max_size);
        cache.extend(entries);

        crate::debug_log!(
            "🗑️ [CACHE-EVICT] Evicted {} entries due to cache size limit",
            evicted.len()
        );
        evicted.len()
    }
}

/// General cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub entry_count: usize,
    pub expired_count: usize,
    pub hits: u64,
    pub misses: u64,
    pub avg_age: Duration,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups > 0 {
            self.hits as f64 / lookups as f64
        } else {
            0.0
        }
    }
}
