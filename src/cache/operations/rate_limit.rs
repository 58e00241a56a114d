use std::sync::Arc;

use async_trait::async_trait;
use redis::{Client as RedisClient, Script};

use crate::cache::{CacheError, CounterStore, WindowKeys};

/// Same decision as `models::rate_limit::apply_hit`, executed atomically
/// inside Redis so concurrent processes never over-admit.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local current = tonumber(redis.call("GET", KEYS[1]) or "0")
local previous = 0
if KEYS[2] then
  previous = tonumber(redis.call("GET", KEYS[2]) or "0")
end
local capacity = tonumber(ARGV[1])
local now = tonumber(ARGV[2])
local window = tonumber(ARGV[3])

local elapsed = (now % window) / window
previous = math.floor((1 - elapsed) * previous)

if previous + current >= capacity then
  return -1
end

local updated = redis.call("INCR", KEYS[1])
if updated == 1 then
  redis.call("PEXPIRE", KEYS[1], window * 2 + 1000)
end

return capacity - (updated + previous)
"#;

/// Redis-backed sliding-window counters.
pub struct RedisCounterStore {
    redis: Arc<RedisClient>,
    script: Script,
}

impl RedisCounterStore {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self {
            redis,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn sliding_window_hit(
        &self,
        keys: &WindowKeys,
        capacity: u32,
        now_ms: u64,
        window_ms: u64,
    ) -> Result<i64, CacheError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let mut invocation = self.script.key(&keys.current);
        if let Some(previous) = &keys.previous {
            invocation.key(previous);
        }
        let remaining: i64 = invocation
            .arg(capacity)
            .arg(now_ms)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        Ok(remaining)
    }
}
