use async_trait::async_trait;

use crate::database::models::{Plan, Subscription};
use crate::database::{PgStore, StoreResult};

const PLAN_COLUMNS: &str = "id, name, slug, product_id, variant_id, interval, price_cents, limits";

#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// The user's most recently updated subscription row, whatever its status.
    async fn find_subscription(&self, user_id: &str) -> StoreResult<Option<Subscription>>;

    async fn find_plan_by_variant(&self, variant_id: &str) -> StoreResult<Option<Plan>>;

    async fn find_plan_by_product(&self, product_id: &str) -> StoreResult<Option<Plan>>;

    async fn find_plan_by_slug(&self, slug: &str) -> StoreResult<Option<Plan>>;
}

impl PgStore {
    async fn find_plan_where(&self, column: &str, value: &str) -> StoreResult<Option<Plan>> {
        let plan = sqlx::query_as::<_, Plan>(&format!(
            "SELECT {} FROM plans WHERE {} = $1 LIMIT 1",
            PLAN_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }
}

#[async_trait]
impl PlanRepository for PgStore {
    async fn find_subscription(&self, user_id: &str) -> StoreResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT user_id, subscription_id, product_id, variant_id, status
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn find_plan_by_variant(&self, variant_id: &str) -> StoreResult<Option<Plan>> {
        self.find_plan_where("variant_id", variant_id).await
    }

    async fn find_plan_by_product(&self, product_id: &str) -> StoreResult<Option<Plan>> {
        self.find_plan_where("product_id", product_id).await
    }

    async fn find_plan_by_slug(&self, slug: &str) -> StoreResult<Option<Plan>> {
        self.find_plan_where("slug", slug).await
    }
}
