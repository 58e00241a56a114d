use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

const ACTIVE_STATUSES: [&str; 2] = ["active", "trialing"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    /// `none`, `month` or `year`.
    pub interval: String,
    pub price_cents: i32,
    /// Untrusted JSON document; see `PlanLimits::from_json`.
    pub limits: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub user_id: String,
    pub subscription_id: Option<String>,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub status: String,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        ACTIVE_STATUSES.contains(&self.status.as_str())
    }
}

/// Subscription state reported by the billing provider.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpsert {
    pub user_id: String,
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}
