use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CounterStore, WindowKeys};
use crate::error::AppError;

use super::clock::{Clock, SystemClock};
use super::table::{LimiterConfig, LimiterName, LimiterTable};

const DEFAULT_MESSAGE: &str = "Rate limit exceeded";

/// What to do when the counter store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Admit the request.
    #[default]
    FailOpen,
    /// Reject the request as if the limit had been hit.
    FailClosed,
}

impl FailurePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "open" | "fail-open" | "fail_open" => Some(FailurePolicy::FailOpen),
            "closed" | "fail-closed" | "fail_closed" => Some(FailurePolicy::FailClosed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitOutcome {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix milliseconds at which the current window ends.
    pub reset: u64,
    /// Seconds until the window resets, set on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Evaluates named limiters against a shared counter store.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    table: LimiterTable,
    policy: FailurePolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, table: LimiterTable, policy: FailurePolicy) -> Self {
        Self {
            store,
            table,
            policy,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn table(&self) -> &LimiterTable {
        &self.table
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub async fn check(&self, name: LimiterName, identifier: &str, message: &str) -> RateLimitOutcome {
        let config = self.table.config(name);
        self.check_config(&config, identifier, message).await
    }

    /// Records one event for `identifier` and reports whether it is admitted.
    pub async fn check_config(
        &self,
        config: &LimiterConfig,
        identifier: &str,
        message: &str,
    ) -> RateLimitOutcome {
        let now = self.clock.now_millis();
        let window_ms = config.window_millis();
        let keys = WindowKeys::new(&config.prefix, identifier, now, window_ms);
        let reset = keys.reset_at(window_ms);

        match self
            .store
            .sliding_window_hit(&keys, config.capacity, now, window_ms)
            .await
        {
            Ok(remaining) if remaining >= 0 => RateLimitOutcome {
                success: true,
                limit: config.capacity,
                remaining: u32::try_from(remaining).unwrap_or(u32::MAX),
                reset,
                retry_after: None,
                error: None,
            },
            Ok(_) => {
                tracing::debug!("Rate limit hit: {} for {}", config.prefix, identifier);
                rejected(config, reset, retry_after_secs(reset, now), message)
            }
            Err(e) => match self.policy {
                FailurePolicy::FailOpen => {
                    tracing::warn!(
                        "Counter store unavailable for {}, admitting request: {}",
                        config.prefix,
                        e
                    );
                    RateLimitOutcome {
                        success: true,
                        limit: config.capacity,
                        remaining: config.capacity,
                        reset,
                        retry_after: None,
                        error: None,
                    }
                }
                FailurePolicy::FailClosed => {
                    tracing::warn!(
                        "Counter store unavailable for {}, rejecting request: {}",
                        config.prefix,
                        e
                    );
                    let window_secs = config.window.as_secs().max(1);
                    rejected(config, now + window_secs * 1000, window_secs, message)
                }
            },
        }
    }

    /// Like `check`, but turns a rejection into `AppError::RateLimited`.
    pub async fn enforce(
        &self,
        name: LimiterName,
        identifier: &str,
        message: &str,
    ) -> Result<RateLimitOutcome, AppError> {
        let outcome = self.check(name, identifier, message).await;
        if outcome.success {
            Ok(outcome)
        } else {
            Err(AppError::from(outcome))
        }
    }
}

fn rejected(config: &LimiterConfig, reset: u64, retry_after: u64, message: &str) -> RateLimitOutcome {
    let error = if message.is_empty() {
        DEFAULT_MESSAGE.to_string()
    } else {
        message.to_string()
    };
    RateLimitOutcome {
        success: false,
        limit: config.capacity,
        remaining: 0,
        reset,
        retry_after: Some(retry_after),
        error: Some(error),
    }
}

fn retry_after_secs(reset: u64, now: u64) -> u64 {
    reset.saturating_sub(now).div_ceil(1000).max(1)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::{CacheError, MemoryCounterStore};
    use crate::ratelimit::ManualClock;

    struct DownStore;

    #[async_trait]
    impl CounterStore for DownStore {
        async fn sliding_window_hit(
            &self,
            _keys: &WindowKeys,
            _capacity: u32,
            _now_ms: u64,
            _window_ms: u64,
        ) -> Result<i64, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    fn limiter(store: Arc<dyn CounterStore>, policy: FailurePolicy, clock: Arc<ManualClock>) -> RateLimiter {
        let table = LimiterTable::standard().with_budget(
            LimiterName::CreateLink,
            3,
            Duration::from_secs(60),
        );
        RateLimiter::new(store, table, policy).with_clock(clock)
    }

    #[tokio::test]
    async fn capacity_plus_one_is_rejected() {
        let clock = Arc::new(ManualClock::new(600_000));
        let limiter = limiter(Arc::new(MemoryCounterStore::new()), FailurePolicy::FailOpen, clock);

        for expected_remaining in [2, 1, 0] {
            let outcome = limiter.check(LimiterName::CreateLink, "user:u1", "slow down").await;
            assert!(outcome.success);
            assert_eq!(outcome.remaining, expected_remaining);
            assert_eq!(outcome.limit, 3);
        }

        let outcome = limiter.check(LimiterName::CreateLink, "user:u1", "slow down").await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("slow down"));
        assert_eq!(outcome.retry_after, Some(60));
        assert_eq!(outcome.reset, 660_000);
    }

    #[tokio::test]
    async fn retry_after_counts_down_to_the_reset() {
        let clock = Arc::new(ManualClock::new(600_000));
        let limiter = limiter(Arc::new(MemoryCounterStore::new()), FailurePolicy::FailOpen, clock.clone());
        for _ in 0..3 {
            limiter.check(LimiterName::CreateLink, "user:u1", "").await;
        }

        clock.advance_millis(45_500);
        let outcome = limiter.check(LimiterName::CreateLink, "user:u1", "").await;
        assert!(!outcome.success);
        assert_eq!(outcome.retry_after, Some(15));
        assert_eq!(outcome.error.as_deref(), Some(DEFAULT_MESSAGE));
    }

    #[tokio::test]
    async fn limiters_and_identifiers_do_not_share_counters() {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = limiter(Arc::new(MemoryCounterStore::new()), FailurePolicy::FailOpen, clock);
        for _ in 0..3 {
            assert!(limiter.check(LimiterName::CreateLink, "user:u1", "").await.success);
        }
        assert!(!limiter.check(LimiterName::CreateLink, "user:u1", "").await.success);

        assert!(limiter.check(LimiterName::CreateLink, "user:u2", "").await.success);
        assert!(limiter.check(LimiterName::DeleteLink, "user:u1", "").await.success);
    }

    #[tokio::test]
    async fn store_failure_follows_policy() {
        let clock = Arc::new(ManualClock::new(0));

        let open = limiter(Arc::new(DownStore), FailurePolicy::FailOpen, clock.clone());
        let outcome = open.check(LimiterName::CreateLink, "user:u1", "nope").await;
        assert!(outcome.success);
        assert_eq!(outcome.remaining, 3);

        let closed = limiter(Arc::new(DownStore), FailurePolicy::FailClosed, clock);
        let outcome = closed.check(LimiterName::CreateLink, "user:u1", "nope").await;
        assert!(!outcome.success);
        assert_eq!(outcome.retry_after, Some(60));
        assert!(closed.enforce(LimiterName::CreateLink, "user:u1", "nope").await.is_err());
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!(FailurePolicy::parse("open"), Some(FailurePolicy::FailOpen));
        assert_eq!(FailurePolicy::parse(" Closed "), Some(FailurePolicy::FailClosed));
        assert_eq!(FailurePolicy::parse("maybe"), None);
    }
}
