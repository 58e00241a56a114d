//! Shared key-value store seams: the rate-limit counter store and the
//! snapshot cache. Redis adapters live in `operations`, in-memory ones in
//! `memory`.

use std::time::Duration;

use async_trait::async_trait;

pub mod keys;
pub mod memory;
pub mod models;
pub mod operations;

pub use memory::{MemoryCache, MemoryCounterStore};
pub use models::WindowKeys;
pub use operations::{RedisCache, RedisCounterStore};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("unexpected reply from store: {0}")]
    Unexpected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Atomic sliding-window counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Records one event against `keys` unless the weighted count has already
    /// reached `capacity`.
    ///
    /// Returns the remaining budget after the hit, or a negative value when the
    /// event was rejected (in which case nothing was recorded).
    async fn sliding_window_hit(
        &self,
        keys: &WindowKeys,
        capacity: u32,
        now_ms: u64,
        window_ms: u64,
    ) -> Result<i64, CacheError>;
}

/// String cache with per-entry expiry.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
