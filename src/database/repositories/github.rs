use async_trait::async_trait;

use crate::database::models::GithubSettings;
use crate::database::{PgStore, StoreResult};

#[async_trait]
pub trait GithubRepository: Send + Sync {
    async fn find_github_settings(&self, user_id: &str) -> StoreResult<Option<GithubSettings>>;

    /// Drops the stored token and clears `users.github_connected`.
    async fn disconnect_github(&self, user_id: &str) -> StoreResult<bool>;
}

#[async_trait]
impl GithubRepository for PgStore {
    async fn find_github_settings(&self, user_id: &str) -> StoreResult<Option<GithubSettings>> {
        let settings = sqlx::query_as::<_, GithubSettings>(
            "SELECT user_id, repo_name, github_access_token FROM github_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    async fn disconnect_github(&self, user_id: &str) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM github_settings WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let updated = sqlx::query("UPDATE users SET github_connected = false WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted > 0 || updated > 0)
    }
}
