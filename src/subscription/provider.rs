use std::sync::Arc;
use std::time::Duration;

use crate::cache::KeyValueCache;
use crate::cache::keys::subscription_snapshot_key;
use crate::database::models::Plan;
use crate::database::repositories::PlanRepository;

use super::snapshot::{FREE_PLAN_SLUG, SubscriptionSnapshot};

pub const DEFAULT_SNAPSHOT_TTL: Duration = Duration::from_secs(300);

/// Cache-aside resolver for a user's plan limits.
///
/// Reads may be up to `ttl` stale after a plan change unless the change is
/// reported through [`SnapshotProvider::invalidate`].
pub struct SnapshotProvider {
    plans: Arc<dyn PlanRepository>,
    cache: Arc<dyn KeyValueCache>,
    ttl: Duration,
}

impl SnapshotProvider {
    pub fn new(plans: Arc<dyn PlanRepository>, cache: Arc<dyn KeyValueCache>, ttl: Duration) -> Self {
        Self { plans, cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Always yields usable limits; store failures degrade to the free plan or
    /// the built-in safety net.
    pub async fn snapshot(&self, user_id: &str) -> SubscriptionSnapshot {
        let key = subscription_snapshot_key(user_id);

        if let Some(snapshot) = self.cached(&key).await {
            return snapshot;
        }

        let plan = self.resolve_plan(user_id).await;
        let Some(snapshot) = plan.as_ref().and_then(SubscriptionSnapshot::from_plan) else {
            tracing::warn!(
                "No valid plan limits for user {}, using safety-net snapshot",
                user_id
            );
            return SubscriptionSnapshot::safety_net();
        };

        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if let Err(e) = self.cache.set_ex(&key, json, self.ttl).await {
                    tracing::warn!("Failed to cache subscription snapshot {}: {}", key, e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize subscription snapshot: {}", e),
        }

        snapshot
    }

    /// Drops the cached snapshot so the next read sees the current plan.
    pub async fn invalidate(&self, user_id: &str) {
        let key = subscription_snapshot_key(user_id);
        match self.cache.delete(&key).await {
            Ok(()) => tracing::debug!("Invalidated subscription snapshot {}", key),
            Err(e) => tracing::warn!("Failed to invalidate subscription snapshot {}: {}", key, e),
        }
    }

    async fn cached(&self, key: &str) -> Option<SubscriptionSnapshot> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Subscription cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str::<SubscriptionSnapshot>(&raw) {
            Ok(snapshot) if !snapshot.plan_id.is_empty() => Some(snapshot),
            _ => {
                tracing::debug!("Ignoring malformed cached snapshot {}", key);
                None
            }
        }
    }

    async fn resolve_plan(&self, user_id: &str) -> Option<Plan> {
        let subscription = match self.plans.find_subscription(user_id).await {
            Ok(subscription) => subscription.filter(|s| s.is_active()),
            Err(e) => {
                tracing::warn!("Failed to load subscription for {}: {}", user_id, e);
                None
            }
        };

        let mut plan = None;
        if let Some(subscription) = subscription {
            // Catalog rows may carry only a product id, so an unknown variant
            // falls through to the product.
            if let Some(variant_id) = subscription.variant_id.as_deref() {
                plan = self
                    .plans
                    .find_plan_by_variant(variant_id)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!("Failed to resolve plan for {}: {}", user_id, e);
                        None
                    });
            }
            if plan.is_none() {
                if let Some(product_id) = subscription.product_id.as_deref() {
                    plan = self
                        .plans
                        .find_plan_by_product(product_id)
                        .await
                        .unwrap_or_else(|e| {
                            tracing::warn!("Failed to resolve plan for {}: {}", user_id, e);
                            None
                        });
                }
            }
        }

        if plan.is_none() {
            plan = self
                .plans
                .find_plan_by_slug(FREE_PLAN_SLUG)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("Failed to load free plan: {}", e);
                    None
                });
        }

        plan
    }
}
