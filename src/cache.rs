//! Resolution caching
//!
//! Resolved frames depend only on the canonical path and the route tree, so
//! they are cached per path with LRU eviction. The cache lives inside a
//! [`RouteConfiguration`](crate::RouteConfiguration) and goes away with it
//! when the tree is replaced.

use crate::resolve::ResolvedFrames;
use crate::trace_log;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
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

/// Resolution cache with LRU eviction
///
/// Negative results (no match) are cached too.
#[derive(Debug)]
pub struct MatchCache {
    entries: LruCache<String, Option<ResolvedFrames>>,
    stats: CacheStats,
}

impl MatchCache {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache holding up to `capacity` paths; zero is treated as one
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    /// Cached resolution for `path`
    ///
    /// The outer `Option` is the cache lookup, the inner one the resolution.
    pub fn get(&mut self, path: &str) -> Option<Option<ResolvedFrames>> {
        if let Some(entry) = self.entries.get(path) {
            self.stats.hits += 1;
            trace_log!("Match cache hit for path: '{}'", path);
            Some(entry.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Match cache miss for path: '{}'", path);
            None
        }
    }

    pub fn insert(&mut self, path: String, resolved: Option<ResolvedFrames>) {
        self.entries.push(path, resolved);
    }

    pub fn clear(&mut self) {
        trace_log!("Clearing match cache");
        self.entries.clear();
        self.stats.invalidations += 1;
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

impl Default for MatchCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RouteParams;

    fn resolved() -> ResolvedFrames {
        ResolvedFrames {
            frames: Vec::new(),
            params: RouteParams::new(),
        }
    }

    #[test]
    fn test_cache_miss_then_hit() {
        let mut cache = MatchCache::new();
        assert!(cache.get("/a").is_none());

        cache.insert("/a".to_string(), Some(resolved()));
        assert!(matches!(cache.get("/a"), Some(Some(_))));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_negative_entries() {
        let mut cache = MatchCache::new();
        cache.insert("/missing".to_string(), None);
        assert!(matches!(cache.get("/missing"), Some(None)));
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = MatchCache::with_capacity(2);
        cache.insert("/a".to_string(), None);
        cache.insert("/b".to_string(), None);
        cache.get("/a");
        cache.insert("/c".to_string(), None);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("/b").is_none());
        assert!(cache.get("/a").is_some());
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = MatchCache::new();
        cache.insert("/a".to_string(), None);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_hit_rate_calculation() {
        let mut cache = MatchCache::new();
        cache.get("/a");
        cache.get("/b");
        cache.get("/c");
        cache.insert("/a".to_string(), None);
        cache.insert("/b".to_string(), None);
        cache.get("/a");
        cache.get("/b");

        assert!((cache.stats().hit_rate() - 0.4).abs() < 0.001);
    }
}
