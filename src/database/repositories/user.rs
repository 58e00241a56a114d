use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::User;
use crate::database::{PgStore, StoreError, StoreResult};

const USER_COLUMNS: &str = "id, name, email, username, github_connected, api_keys_count, \
                            total_collections, top_collections";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Fails with `StoreError::Conflict` when another user holds the name.
    async fn set_username(&self, user_id: &str, username: &str) -> StoreResult<Option<User>>;

    async fn set_top_collections(&self, user_id: &str, ids: &[Uuid]) -> StoreResult<Option<User>>;
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_username(&self, user_id: &str, username: &str) -> StoreResult<Option<User>> {
        let result = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET username = $1 WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) => match StoreError::from(e) {
                StoreError::Conflict(_) => {
                    Err(StoreError::Conflict("Username already taken".to_string()))
                }
                other => Err(other),
            },
        }
    }

    async fn set_top_collections(&self, user_id: &str, ids: &[Uuid]) -> StoreResult<Option<User>> {
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET top_collections = $1 WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&ids)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
