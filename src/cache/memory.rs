//! In-process stores with the same semantics as the Redis adapters. Used by
//! tests and single-node development runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::models::apply_hit;
use crate::cache::{CacheError, CounterStore, KeyValueCache, WindowKeys};
use crate::ratelimit::{Clock, SystemClock};

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u64,
    expires_at: u64,
}

#[derive(Default)]
pub struct MemoryCounterStore {
    counters: RwLock<HashMap<String, Counter>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Window keys held, expired or not.
    pub async fn len(&self) -> usize {
        self.counters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn live_count(counters: &HashMap<String, Counter>, key: &str, now_ms: u64) -> u64 {
    counters
        .get(key)
        .filter(|c| c.expires_at > now_ms)
        .map(|c| c.count)
        .unwrap_or(0)
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn sliding_window_hit(
        &self,
        keys: &WindowKeys,
        capacity: u32,
        now_ms: u64,
        window_ms: u64,
    ) -> Result<i64, CacheError> {
        let mut counters = self.counters.write().await;

        let current = live_count(&counters, &keys.current, now_ms);
        let previous = keys
            .previous
            .as_deref()
            .map_or(0, |key| live_count(&counters, key, now_ms));

        let Some(remaining) = apply_hit(current, previous, capacity, now_ms, window_ms) else {
            return Ok(-1);
        };

        let expires_at = if current == 0 {
            // A new window key: drop the ones that have run out first.
            counters.retain(|_, c| c.expires_at > now_ms);
            now_ms + window_ms * 2 + 1000
        } else {
            counters
                .get(&keys.current)
                .map(|c| c.expires_at)
                .unwrap_or(now_ms + window_ms * 2 + 1000)
        };
        counters.insert(
            keys.current.clone(),
            Counter {
                count: current + 1,
                expires_at,
            },
        );

        Ok(remaining)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: u64,
}

/// Expiring string cache keyed off an injected clock.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        matches!(self.get(key).await, Ok(Some(_)))
    }

    /// Entries held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.now_millis();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let now = self.clock.now_millis();
        let expires_at = now.saturating_add(ttl_ms);
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::ManualClock;

    #[tokio::test]
    async fn counter_store_stops_at_capacity() {
        let store = MemoryCounterStore::new();
        let keys = WindowKeys::new("p", "id", 1_000, 60_000);

        assert_eq!(store.sliding_window_hit(&keys, 2, 1_000, 60_000).await.unwrap(), 1);
        assert_eq!(store.sliding_window_hit(&keys, 2, 1_000, 60_000).await.unwrap(), 0);
        assert!(store.sliding_window_hit(&keys, 2, 1_000, 60_000).await.unwrap() < 0);
    }

    #[tokio::test]
    async fn first_window_counts_each_hit_once() {
        let store = MemoryCounterStore::new();
        let keys = WindowKeys::new("p", "id", 0, 60_000);

        assert_eq!(store.sliding_window_hit(&keys, 3, 0, 60_000).await.unwrap(), 2);
        assert_eq!(store.sliding_window_hit(&keys, 3, 0, 60_000).await.unwrap(), 1);
        assert_eq!(store.sliding_window_hit(&keys, 3, 0, 60_000).await.unwrap(), 0);
        assert!(store.sliding_window_hit(&keys, 3, 0, 60_000).await.unwrap() < 0);
    }

    #[tokio::test]
    async fn expired_window_keys_are_dropped() {
        let store = MemoryCounterStore::new();
        for (i, now) in [0u64, 60_000, 120_000, 180_000, 240_000].into_iter().enumerate() {
            let keys = WindowKeys::new("p", "id", now, 60_000);
            store.sliding_window_hit(&keys, 10, now, 60_000).await.unwrap();
            // Keys live for two windows plus a second, so at most three are held.
            assert!(store.len().await <= 3, "window {} kept {} keys", i, store.len().await);
        }
    }

    #[tokio::test]
    async fn previous_window_still_counts_early_in_the_next() {
        let store = MemoryCounterStore::new();
        let first = WindowKeys::new("p", "id", 59_000, 60_000);
        for _ in 0..4 {
            store.sliding_window_hit(&first, 4, 59_000, 60_000).await.unwrap();
        }

        // 1s into the next window, three of the previous four hits still weigh in.
        let next = WindowKeys::new("p", "id", 61_000, 60_000);
        assert_eq!(store.sliding_window_hit(&next, 4, 61_000, 60_000).await.unwrap(), 0);
        assert!(store.sliding_window_hit(&next, 4, 61_000, 60_000).await.unwrap() < 0);

        // Past the overlap everything is admitted again.
        let later = WindowKeys::new("p", "id", 125_000, 60_000);
        assert_eq!(store.sliding_window_hit(&later, 4, 125_000, 60_000).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn cache_entries_expire() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = MemoryCache::with_clock(clock.clone());

        cache.set_ex("k", "v".into(), Duration::from_secs(300)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        clock.advance_secs(300);
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_cache_entries_are_dropped_on_write() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = MemoryCache::with_clock(clock.clone());

        cache.set_ex("a", "1".into(), Duration::from_secs(10)).await.unwrap();
        cache.set_ex("b", "2".into(), Duration::from_secs(10)).await.unwrap();
        assert_eq!(cache.len().await, 2);

        clock.advance_secs(11);
        cache.set_ex("c", "3".into(), Duration::from_secs(10)).await.unwrap();
        assert_eq!(cache.len().await, 1);
        assert!(cache.contains("c").await);
    }

    #[tokio::test]
    async fn cache_delete_removes_entry() {
        let cache = MemoryCache::new();
        cache.set_ex("k", "v".into(), Duration::from_secs(60)).await.unwrap();
        cache.delete("k").await.unwrap();
        assert!(!cache.contains("k").await);
    }
}
