use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{Link, NewLink};
use crate::database::{PgStore, StoreResult};

const LINK_COLUMNS: &str = "id, title, url, link_collection_id, user_id, created_at, updated_at";

#[async_trait]
pub trait LinkRepository: Send + Sync {
    async fn count_links_in_collection(&self, user_id: &str, collection_id: Uuid) -> StoreResult<i64>;

    /// Links owned by `user_id` across every collection.
    async fn count_links(&self, user_id: &str) -> StoreResult<i64>;

    /// Inserts the link and atomically increments the collection's
    /// `total_links`. Returns the link and the new total.
    async fn insert_link(&self, new: &NewLink) -> StoreResult<(Link, i32)>;

    /// Deletes the link and atomically decrements its collection's
    /// `total_links`.
    async fn delete_link(&self, user_id: &str, link_id: Uuid) -> StoreResult<Option<Link>>;

    async fn list_links(&self, user_id: &str, collection_id: Uuid) -> StoreResult<Vec<Link>>;
}

#[async_trait]
impl LinkRepository for PgStore {
    async fn count_links_in_collection(&self, user_id: &str, collection_id: Uuid) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM links WHERE user_id = $1 AND link_collection_id = $2",
        )
        .bind(user_id)
        .bind(collection_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_links(&self, user_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn insert_link(&self, new: &NewLink) -> StoreResult<(Link, i32)> {
        let mut tx = self.pool.begin().await?;

        let link = sqlx::query_as::<_, Link>(&format!(
            r#"
            INSERT INTO links (title, url, link_collection_id, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            LINK_COLUMNS
        ))
        .bind(&new.title)
        .bind(&new.url)
        .bind(new.collection_id)
        .bind(&new.user_id)
        .fetch_one(&mut *tx)
        .await?;

        let total: i32 = sqlx::query_scalar(
            r#"
            UPDATE collections
            SET total_links = total_links + 1, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING total_links
            "#,
        )
        .bind(new.collection_id)
        .bind(&new.user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((link, total))
    }

    async fn delete_link(&self, user_id: &str, link_id: Uuid) -> StoreResult<Option<Link>> {
        let mut tx = self.pool.begin().await?;

        let link = sqlx::query_as::<_, Link>(&format!(
            "DELETE FROM links WHERE id = $1 AND user_id = $2 RETURNING {}",
            LINK_COLUMNS
        ))
        .bind(link_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(ref l) = link {
            sqlx::query(
                r#"
                UPDATE collections
                SET total_links = GREATEST(total_links - 1, 0), updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(l.link_collection_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(link)
    }

    async fn list_links(&self, user_id: &str, collection_id: Uuid) -> StoreResult<Vec<Link>> {
        let links = sqlx::query_as::<_, Link>(&format!(
            r#"
            SELECT {} FROM links
            WHERE user_id = $1 AND link_collection_id = $2
            ORDER BY created_at DESC
            "#,
            LINK_COLUMNS
        ))
        .bind(user_id)
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }
}
