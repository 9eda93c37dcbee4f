//! Read-through cache for dashboard statistics.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::models::BlogPost;

#[derive(Clone)]
enum CachedValue {
    Count(i64),
    Posts(Vec<BlogPost>),
}

struct Entry {
    stored_at: Instant,
    value: CachedValue,
}

/// TTL cache for the dashboard counters and the random-post sample.
///
/// Callers try the cache first and store the fresh value after a miss.
/// Entries past the TTL miss; with caching disabled every lookup misses and
/// stores are dropped. State is process-local.
#[derive(Clone)]
pub struct StatsCache {
    entries: Arc<RwLock<HashMap<&'static str, Entry>>>,
    ttl: Duration,
    enabled: bool,
}

impl StatsCache {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            enabled,
        }
    }

    pub fn get_count(&self, key: &'static str) -> Option<i64> {
        match self.get(key)? {
            CachedValue::Count(v) => Some(v),
            _ => None,
        }
    }

    pub fn put_count(&self, key: &'static str, value: i64) {
        self.put(key, CachedValue::Count(value));
    }

    pub fn get_posts(&self, key: &'static str) -> Option<Vec<BlogPost>> {
        match self.get(key)? {
            CachedValue::Posts(posts) => Some(posts),
            _ => None,
        }
    }

    pub fn put_posts(&self, key: &'static str, posts: Vec<BlogPost>) {
        self.put(key, CachedValue::Posts(posts));
    }

    fn get(&self, key: &'static str) -> Option<CachedValue> {
        if !self.enabled {
            return None;
        }

        let entries = self.entries.read().unwrap();
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }

        Some(entry.value.clone())
    }

    fn put(&self, key: &'static str, value: CachedValue) {
        if !self.enabled {
            return;
        }

        let mut entries = self.entries.write().unwrap();
        entries.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                value,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entries_hit() {
        let cache = StatsCache::new(Duration::from_secs(60), true);
        cache.put_count("newsletters", 7);

        assert_eq!(cache.get_count("newsletters"), Some(7));
        assert_eq!(cache.get_count("clients"), None);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = StatsCache::new(Duration::ZERO, true);
        cache.put_count("newsletters", 7);

        assert_eq!(cache.get_count("newsletters"), None);
    }

    #[test]
    fn disabled_cache_never_hits() {
        let cache = StatsCache::new(Duration::from_secs(60), false);
        cache.put_count("newsletters", 7);

        assert_eq!(cache.get_count("newsletters"), None);
    }

    #[test]
    fn count_and_post_keys_do_not_collide() {
        let cache = StatsCache::new(Duration::from_secs(60), true);
        cache.put_posts("random_posts", vec![]);

        assert_eq!(cache.get_count("random_posts"), None);
        assert!(cache.get_posts("random_posts").is_some());
    }
}
