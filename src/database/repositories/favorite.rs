use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::Favorite;
use crate::database::{PgStore, StoreResult};

const FAVORITE_COLUMNS: &str = "id, title, url, user_id, created_at, updated_at";

#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    async fn count_favorites(&self, user_id: &str) -> StoreResult<i64>;

    async fn create_favorite(&self, user_id: &str, title: &str, url: &str) -> StoreResult<Favorite>;

    async fn update_favorite(&self, user_id: &str, id: Uuid, title: &str, url: &str) -> StoreResult<Option<Favorite>>;

    async fn delete_favorite(&self, user_id: &str, id: Uuid) -> StoreResult<bool>;

    async fn list_favorites(&self, user_id: &str) -> StoreResult<Vec<Favorite>>;
}

#[async_trait]
impl FavoriteRepository for PgStore {
    async fn count_favorites(&self, user_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create_favorite(&self, user_id: &str, title: &str, url: &str) -> StoreResult<Favorite> {
        let favorite = sqlx::query_as::<_, Favorite>(&format!(
            "INSERT INTO favorites (title, url, user_id) VALUES ($1, $2, $3) RETURNING {}",
            FAVORITE_COLUMNS
        ))
        .bind(title)
        .bind(url)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(favorite)
    }

    async fn update_favorite(&self, user_id: &str, id: Uuid, title: &str, url: &str) -> StoreResult<Option<Favorite>> {
        let favorite = sqlx::query_as::<_, Favorite>(&format!(
            r#"
            UPDATE favorites SET title = $1, url = $2, updated_at = NOW()
            WHERE id = $3 AND user_id = $4
            RETURNING {}
            "#,
            FAVORITE_COLUMNS
        ))
        .bind(title)
        .bind(url)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(favorite)
    }

    async fn delete_favorite(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let deleted = sqlx::query("DELETE FROM favorites WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn list_favorites(&self, user_id: &str) -> StoreResult<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(&format!(
            "SELECT {} FROM favorites WHERE user_id = $1 ORDER BY created_at DESC",
            FAVORITE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(favorites)
    }
}
