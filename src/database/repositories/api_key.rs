use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::ApiKey;
use crate::database::{PgStore, StoreResult};

const API_KEY_COLUMNS: &str = "id, user_id, name, key_hash, key_prefix, created_at";

#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    async fn count_api_keys(&self, user_id: &str) -> StoreResult<i64>;

    /// Stores the hashed key and bumps the owner's `api_keys_count`.
    async fn create_api_key(&self, user_id: &str, name: &str, key_hash: &str, key_prefix: &str) -> StoreResult<ApiKey>;

    async fn delete_api_key(&self, user_id: &str, id: Uuid) -> StoreResult<bool>;

    async fn list_api_keys(&self, user_id: &str) -> StoreResult<Vec<ApiKey>>;
}

#[async_trait]
impl ApiKeyRepository for PgStore {
    async fn count_api_keys(&self, user_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create_api_key(&self, user_id: &str, name: &str, key_hash: &str, key_prefix: &str) -> StoreResult<ApiKey> {
        let mut tx = self.pool.begin().await?;

        let key = sqlx::query_as::<_, ApiKey>(&format!(
            r#"
            INSERT INTO api_keys (user_id, name, key_hash, key_prefix)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            API_KEY_COLUMNS
        ))
        .bind(user_id)
        .bind(name)
        .bind(key_hash)
        .bind(key_prefix)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET api_keys_count = api_keys_count + 1 WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(key)
    }

    async fn delete_api_key(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted > 0 {
            sqlx::query(
                "UPDATE users SET api_keys_count = GREATEST(api_keys_count - 1, 0) WHERE id = $1",
            )
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(deleted > 0)
    }

    async fn list_api_keys(&self, user_id: &str) -> StoreResult<Vec<ApiKey>> {
        let keys = sqlx::query_as::<_, ApiKey>(&format!(
            "SELECT {} FROM api_keys WHERE user_id = $1 ORDER BY created_at",
            API_KEY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }
}
