use async_trait::async_trait;

use crate::database::models::SubscriptionUpsert;
use crate::database::{PgStore, StoreResult};

#[async_trait]
pub trait BillingRepository: Send + Sync {
    /// Records a webhook delivery. Returns `false` if the event id was seen
    /// before.
    async fn record_webhook_event(&self, event_id: &str, event_type: &str, payload_hash: &str) -> StoreResult<bool>;

    async fn mark_webhook_event(&self, event_id: &str, status: &str, error: Option<&str>) -> StoreResult<()>;

    /// Updates the row with the same provider subscription id, or inserts one.
    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> StoreResult<()>;
}

#[async_trait]
impl BillingRepository for PgStore {
    async fn record_webhook_event(&self, event_id: &str, event_type: &str, payload_hash: &str) -> StoreResult<bool> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO billing_events (event_id, type, payload_hash, status)
            VALUES ($1, $2, $3, 'received')
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(payload_hash)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(inserted > 0)
    }

    async fn mark_webhook_event(&self, event_id: &str, status: &str, error: Option<&str>) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE billing_events
            SET status = $1, error = $2, processed_at = NOW()
            WHERE event_id = $3
            "#,
        )
        .bind(status)
        .bind(error)
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = match upsert.subscription_id.as_deref() {
            Some(subscription_id) => sqlx::query(
                r#"
                UPDATE subscriptions
                SET user_id = $1, store_customer_id = $2, product_id = $3, variant_id = $4,
                    status = $5, current_period_end = $6, cancel_at_period_end = $7,
                    updated_at = NOW()
                WHERE subscription_id = $8
                "#,
            )
            .bind(&upsert.user_id)
            .bind(&upsert.customer_id)
            .bind(&upsert.product_id)
            .bind(&upsert.variant_id)
            .bind(&upsert.status)
            .bind(upsert.current_period_end)
            .bind(upsert.cancel_at_period_end)
            .bind(subscription_id)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            None => 0,
        };

        if updated == 0 {
            sqlx::query(
                r#"
                INSERT INTO subscriptions (
                    user_id, store_customer_id, subscription_id, product_id, variant_id,
                    status, current_period_end, cancel_at_period_end
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(&upsert.user_id)
            .bind(&upsert.customer_id)
            .bind(&upsert.subscription_id)
            .bind(&upsert.product_id)
            .bind(&upsert.variant_id)
            .bind(&upsert.status)
            .bind(upsert.current_period_end)
            .bind(upsert.cancel_at_period_end)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}
