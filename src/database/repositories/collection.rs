use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{Collection, NewCollection};
use crate::database::{PgStore, StoreResult};

const COLLECTION_COLUMNS: &str = "id, title, description, user_id, visibility, likes, \
                                  total_links, created_at, updated_at";

#[async_trait]
pub trait CollectionRepository: Send + Sync {
    async fn count_collections(&self, user_id: &str) -> StoreResult<i64>;

    /// Inserts the collection and bumps the owner's `total_collections`.
    async fn create_collection(&self, user_id: &str, new: &NewCollection) -> StoreResult<Collection>;

    async fn find_collection(&self, user_id: &str, id: Uuid) -> StoreResult<Option<Collection>>;

    async fn list_collections(&self, user_id: &str) -> StoreResult<Vec<Collection>>;

    async fn list_public_collections(&self, limit: i64, offset: i64) -> StoreResult<Vec<Collection>>;

    async fn list_public_collections_by_user(&self, user_id: &str) -> StoreResult<Vec<Collection>>;

    async fn rename_collection(&self, user_id: &str, id: Uuid, title: &str) -> StoreResult<Option<Collection>>;

    async fn set_visibility(&self, user_id: &str, id: Uuid, visibility: &str) -> StoreResult<Option<Collection>>;

    /// Removes the collection (links cascade), unpins it and decrements the
    /// owner's `total_collections`. Returns whether anything was deleted.
    async fn delete_collection(&self, user_id: &str, id: Uuid) -> StoreResult<bool>;

    /// How many of `ids` belong to `user_id`.
    async fn count_owned_collections(&self, user_id: &str, ids: &[Uuid]) -> StoreResult<i64>;
}

#[async_trait]
impl CollectionRepository for PgStore {
    async fn count_collections(&self, user_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create_collection(&self, user_id: &str, new: &NewCollection) -> StoreResult<Collection> {
        let mut tx = self.pool.begin().await?;

        let collection = sqlx::query_as::<_, Collection>(&format!(
            r#"
            INSERT INTO collections (title, description, user_id, visibility)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            COLLECTION_COLUMNS
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(user_id)
        .bind(&new.visibility)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE users SET total_collections = total_collections + 1 WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(collection)
    }

    async fn find_collection(&self, user_id: &str, id: Uuid) -> StoreResult<Option<Collection>> {
        let collection = sqlx::query_as::<_, Collection>(&format!(
            "SELECT {} FROM collections WHERE id = $1 AND user_id = $2",
            COLLECTION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(collection)
    }

    async fn list_collections(&self, user_id: &str) -> StoreResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(&format!(
            "SELECT {} FROM collections WHERE user_id = $1 ORDER BY updated_at DESC",
            COLLECTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(collections)
    }

    async fn list_public_collections(&self, limit: i64, offset: i64) -> StoreResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(&format!(
            r#"
            SELECT {} FROM collections
            WHERE visibility = 'public'
            ORDER BY likes DESC, updated_at DESC
            LIMIT $1 OFFSET $2
            "#,
            COLLECTION_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(collections)
    }

    async fn list_public_collections_by_user(&self, user_id: &str) -> StoreResult<Vec<Collection>> {
        let collections = sqlx::query_as::<_, Collection>(&format!(
            r#"
            SELECT {} FROM collections
            WHERE user_id = $1 AND visibility = 'public'
            ORDER BY updated_at DESC
            "#,
            COLLECTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(collections)
    }

    async fn rename_collection(&self, user_id: &str, id: Uuid, title: &str) -> StoreResult<Option<Collection>> {
        let collection = sqlx::query_as::<_, Collection>(&format!(
            r#"
            UPDATE collections SET title = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING {}
            "#,
            COLLECTION_COLUMNS
        ))
        .bind(title)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(collection)
    }

    async fn set_visibility(&self, user_id: &str, id: Uuid, visibility: &str) -> StoreResult<Option<Collection>> {
        let collection = sqlx::query_as::<_, Collection>(&format!(
            r#"
            UPDATE collections SET visibility = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING {}
            "#,
            COLLECTION_COLUMNS
        ))
        .bind(visibility)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(collection)
    }

    async fn delete_collection(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM collections WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted > 0 {
            sqlx::query(
                r#"
                UPDATE users
                SET total_collections = GREATEST(total_collections - 1, 0),
                    top_collections = array_remove(top_collections, $2)
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(deleted > 0)
    }

    async fn count_owned_collections(&self, user_id: &str, ids: &[Uuid]) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM collections WHERE user_id = $1 AND id = ANY($2)",
        )
        .bind(user_id)
        .bind(ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
