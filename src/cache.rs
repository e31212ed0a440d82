//! Route resolution caching
//!
//! Remembers which route table entry a pathname resolved to (or that it resolved to nothing)
//! with LRU eviction. The owning [`RouteTable`](crate::RouteTable) clears it whenever its
//! entries change, since positions are only meaningful for one registration set.

use crate::{trace_log, RouteParams};
use lru::LruCache;
use std::num::NonZeroUsize;

/// A remembered resolution: entry position plus extracted params
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResolution {
    /// Position of the matching entry in the route table
    pub index: usize,
    /// Parameters the entry's pattern extracted
    pub params: RouteParams,
}

/// Hit, miss and invalidation counters for a [`ResolveCache`]
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Pathname resolution cache with LRU eviction
///
/// Default capacity: 1000 entries.
#[derive(Debug)]
pub struct ResolveCache {
    entries: LruCache<String, Option<CachedResolution>>,
    stats: CacheStats,
}

impl ResolveCache {
    const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(capacity) => capacity,
        None => NonZeroUsize::MIN,
    };

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn clear(&mut self) {
        trace_log!("Clearing route resolution cache");
        self.entries.clear();
        self.stats.invalidations += 1;
    }

    /// Look up a pathname
    ///
    /// The outer `Option` is hit/miss; the inner one is "resolved to nothing".
    pub fn get(&mut self, pathname: &str) -> Option<Option<CachedResolution>> {
        if let Some(entry) = self.entries.get(pathname) {
            self.stats.hits += 1;
            trace_log!("Resolve cache hit for path: '{}'", pathname);
            Some(entry.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Resolve cache miss for path: '{}'", pathname);
            None
        }
    }

    pub fn insert(&mut self, pathname: String, resolution: Option<CachedResolution>) {
        self.entries.push(pathname, resolution);
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResolveCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(index: usize) -> Option<CachedResolution> {
        Some(CachedResolution {
            index,
            params: RouteParams::new(),
        })
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = ResolveCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_cache_miss_then_hit() {
        let mut cache = ResolveCache::new();
        assert!(cache.get("/pages/first").is_none());
        assert_eq!(cache.stats().misses, 1);

        cache.insert("/pages/first".to_string(), resolution(0));
        assert_eq!(cache.get("/pages/first"), Some(resolution(0)));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_negative_entries_are_hits() {
        let mut cache = ResolveCache::new();
        cache.insert("/nowhere".to_string(), None);
        assert_eq!(cache.get("/nowhere"), Some(None));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_clear_drops_resolutions() {
        let mut cache = ResolveCache::new();
        cache.insert("/a".to_string(), resolution(1));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = ResolveCache::with_capacity(NonZeroUsize::new(2).unwrap());
        cache.insert("/a".to_string(), resolution(0));
        cache.insert("/b".to_string(), resolution(1));
        cache.insert("/c".to_string(), resolution(2));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("/a").is_none());
    }

    #[test]
    fn test_hit_rate_over_lookups() {
        let mut cache = ResolveCache::new();
        cache.get("/a");
        cache.get("/b");
        cache.get("/c");

        cache.insert("/a".to_string(), resolution(0));
        cache.insert("/b".to_string(), None);

        cache.get("/a");
        cache.get("/b");

        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 3);
        assert!((cache.stats().hit_rate() - 0.4).abs() < 0.001);
        cache.reset_stats();
        assert_eq!(cache.stats().misses, 0);
    }
}
