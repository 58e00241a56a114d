//! In-memory implementation of every repository port, with the same
//! counter-maintenance rules as the Postgres store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    ApiKey, Collection, Favorite, GithubSettings, Link, NewCollection, NewLink, Plan,
    Subscription, SubscriptionUpsert, User,
};
use crate::database::repositories::{
    ApiKeyRepository, BillingRepository, CollectionRepository, FavoriteRepository,
    GithubRepository, LinkRepository, PlanRepository, UserRepository,
};
use crate::database::seed::standard_plans;
use crate::database::{StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    collections: Vec<Collection>,
    links: Vec<Link>,
    favorites: Vec<Favorite>,
    api_keys: Vec<ApiKey>,
    plans: Vec<Plan>,
    subscriptions: Vec<(SubscriptionUpsert, i64)>,
    billing_events: HashMap<String, String>,
    github: HashMap<String, GithubSettings>,
    sequence: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    plan_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the standard plan catalog, as a migrated database does.
    pub fn seeded() -> Self {
        Self {
            tables: RwLock::new(Tables {
                plans: standard_plans(),
                ..Tables::default()
            }),
            plan_queries: AtomicUsize::new(0),
        }
    }

    /// Number of plan/subscription lookups served so far.
    pub fn plan_queries(&self) -> usize {
        self.plan_queries.load(Ordering::SeqCst)
    }

    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id.clone(), user);
    }

    pub async fn insert_plan(&self, plan: Plan) {
        self.tables.write().await.plans.push(plan);
    }

    pub async fn insert_github_settings(&self, settings: GithubSettings) {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.get_mut(&settings.user_id) {
            user.github_connected = true;
        }
        tables.github.insert(settings.user_id.clone(), settings);
    }

    pub async fn collection(&self, id: Uuid) -> Option<Collection> {
        self.tables
            .read()
            .await
            .collections
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub async fn link_count(&self) -> usize {
        self.tables.read().await.links.len()
    }

    pub async fn api_key_rows(&self) -> Vec<ApiKey> {
        self.tables.read().await.api_keys.clone()
    }

    pub async fn webhook_event_status(&self, event_id: &str) -> Option<String> {
        self.tables.read().await.billing_events.get(event_id).cloned()
    }

    fn count_plan_query(&self) {
        self.plan_queries.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn set_username(&self, user_id: &str, username: &str) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|u| u.id != user_id && u.username.as_deref() == Some(username));
        if taken {
            return Err(StoreError::Conflict("Username already taken".to_string()));
        }

        Ok(tables.users.get_mut(user_id).map(|u| {
            u.username = Some(username.to_string());
            u.clone()
        }))
    }

    async fn set_top_collections(&self, user_id: &str, ids: &[Uuid]) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(user_id).map(|u| {
            u.top_collections = ids.iter().map(Uuid::to_string).collect();
            u.clone()
        }))
    }
}

#[async_trait]
impl CollectionRepository for MemoryStore {
    async fn count_collections(&self, user_id: &str) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.collections.iter().filter(|c| c.user_id == user_id).count() as i64)
    }

    async fn create_collection(&self, user_id: &str, new: &NewCollection) -> StoreResult<Collection> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let collection = Collection {
            id: Uuid::new_v4(),
            title: new.title.clone(),
            description: new.description.clone(),
            user_id: user_id.to_string(),
            visibility: new.visibility.clone(),
            likes: 0,
            total_links: 0,
            created_at: now,
            updated_at: now,
        };
        tables.collections.push(collection.clone());
        if let Some(user) = tables.users.get_mut(user_id) {
            user.total_collections += 1;
        }
        Ok(collection)
    }

    async fn find_collection(&self, user_id: &str, id: Uuid) -> StoreResult<Option<Collection>> {
        let tables = self.tables.read().await;
        Ok(tables
            .collections
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn list_collections(&self, user_id: &str) -> StoreResult<Vec<Collection>> {
        let tables = self.tables.read().await;
        let mut collections: Vec<_> = tables
            .collections
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        collections.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(collections)
    }

    async fn list_public_collections(&self, limit: i64, offset: i64) -> StoreResult<Vec<Collection>> {
        let tables = self.tables.read().await;
        let mut collections: Vec<_> = tables
            .collections
            .iter()
            .filter(|c| c.is_public())
            .cloned()
            .collect();
        collections.sort_by(|a, b| b.likes.cmp(&a.likes).then(b.updated_at.cmp(&a.updated_at)));
        Ok(collections
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_public_collections_by_user(&self, user_id: &str) -> StoreResult<Vec<Collection>> {
        Ok(self
            .list_collections(user_id)
            .await?
            .into_iter()
            .filter(Collection::is_public)
            .collect())
    }

    async fn rename_collection(&self, user_id: &str, id: Uuid, title: &str) -> StoreResult<Option<Collection>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .collections
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)
            .map(|c| {
                c.title = title.to_string();
                c.updated_at = Utc::now();
                c.clone()
            }))
    }

    async fn set_visibility(&self, user_id: &str, id: Uuid, visibility: &str) -> StoreResult<Option<Collection>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .collections
            .iter_mut()
            .find(|c| c.id == id && c.user_id == user_id)
            .map(|c| {
                c.visibility = visibility.to_string();
                c.updated_at = Utc::now();
                c.clone()
            }))
    }

    async fn delete_collection(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.collections.len();
        tables
            .collections
            .retain(|c| !(c.id == id && c.user_id == user_id));
        let deleted = tables.collections.len() < before;

        if deleted {
            tables.links.retain(|l| l.link_collection_id != id);
            if let Some(user) = tables.users.get_mut(user_id) {
                user.total_collections = (user.total_collections - 1).max(0);
                let id = id.to_string();
                user.top_collections.retain(|c| *c != id);
            }
        }
        Ok(deleted)
    }

    async fn count_owned_collections(&self, user_id: &str, ids: &[Uuid]) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .collections
            .iter()
            .filter(|c| c.user_id == user_id && ids.contains(&c.id))
            .count() as i64)
    }
}

#[async_trait]
impl LinkRepository for MemoryStore {
    async fn count_links_in_collection(&self, user_id: &str, collection_id: Uuid) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .iter()
            .filter(|l| l.user_id == user_id && l.link_collection_id == collection_id)
            .count() as i64)
    }

    async fn count_links(&self, user_id: &str) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.links.iter().filter(|l| l.user_id == user_id).count() as i64)
    }

    async fn insert_link(&self, new: &NewLink) -> StoreResult<(Link, i32)> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let Some(collection) = tables
            .collections
            .iter_mut()
            .find(|c| c.id == new.collection_id && c.user_id == new.user_id)
        else {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        };
        collection.total_links += 1;
        collection.updated_at = now;
        let total = collection.total_links;

        let link = Link {
            id: Uuid::new_v4(),
            title: new.title.clone(),
            url: new.url.clone(),
            link_collection_id: new.collection_id,
            user_id: new.user_id.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.links.push(link.clone());

        Ok((link, total))
    }

    async fn delete_link(&self, user_id: &str, link_id: Uuid) -> StoreResult<Option<Link>> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables
            .links
            .iter()
            .position(|l| l.id == link_id && l.user_id == user_id)
        else {
            return Ok(None);
        };

        let link = tables.links.remove(index);
        if let Some(collection) = tables
            .collections
            .iter_mut()
            .find(|c| c.id == link.link_collection_id)
        {
            collection.total_links = (collection.total_links - 1).max(0);
        }
        Ok(Some(link))
    }

    async fn list_links(&self, user_id: &str, collection_id: Uuid) -> StoreResult<Vec<Link>> {
        let tables = self.tables.read().await;
        Ok(tables
            .links
            .iter()
            .rev()
            .filter(|l| l.user_id == user_id && l.link_collection_id == collection_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FavoriteRepository for MemoryStore {
    async fn count_favorites(&self, user_id: &str) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.favorites.iter().filter(|f| f.user_id == user_id).count() as i64)
    }

    async fn create_favorite(&self, user_id: &str, title: &str, url: &str) -> StoreResult<Favorite> {
        let mut tables = self.tables.write().await;
        if tables.favorites.iter().any(|f| f.user_id == user_id && f.url == url) {
            return Err(StoreError::Conflict("favorites_user_id_url_key".to_string()));
        }

        let now = Utc::now();
        let favorite = Favorite {
            id: Uuid::new_v4(),
            title: title.to_string(),
            url: url.to_string(),
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.favorites.push(favorite.clone());
        Ok(favorite)
    }

    async fn update_favorite(&self, user_id: &str, id: Uuid, title: &str, url: &str) -> StoreResult<Option<Favorite>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .favorites
            .iter_mut()
            .find(|f| f.id == id && f.user_id == user_id)
            .map(|f| {
                f.title = title.to_string();
                f.url = url.to_string();
                f.updated_at = Utc::now();
                f.clone()
            }))
    }

    async fn delete_favorite(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.favorites.len();
        tables.favorites.retain(|f| !(f.id == id && f.user_id == user_id));
        Ok(tables.favorites.len() < before)
    }

    async fn list_favorites(&self, user_id: &str) -> StoreResult<Vec<Favorite>> {
        let tables = self.tables.read().await;
        Ok(tables
            .favorites
            .iter()
            .rev()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ApiKeyRepository for MemoryStore {
    async fn count_api_keys(&self, user_id: &str) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.api_keys.iter().filter(|k| k.user_id == user_id).count() as i64)
    }

    async fn create_api_key(&self, user_id: &str, name: &str, key_hash: &str, key_prefix: &str) -> StoreResult<ApiKey> {
        let mut tables = self.tables.write().await;
        let key = ApiKey {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            key_hash: key_hash.to_string(),
            key_prefix: key_prefix.to_string(),
            created_at: Utc::now(),
        };
        tables.api_keys.push(key.clone());
        if let Some(user) = tables.users.get_mut(user_id) {
            user.api_keys_count += 1;
        }
        Ok(key)
    }

    async fn delete_api_key(&self, user_id: &str, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.api_keys.len();
        tables.api_keys.retain(|k| !(k.id == id && k.user_id == user_id));
        let deleted = tables.api_keys.len() < before;
        if deleted {
            if let Some(user) = tables.users.get_mut(user_id) {
                user.api_keys_count = (user.api_keys_count - 1).max(0);
            }
        }
        Ok(deleted)
    }

    async fn list_api_keys(&self, user_id: &str) -> StoreResult<Vec<ApiKey>> {
        let tables = self.tables.read().await;
        Ok(tables
            .api_keys
            .iter()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PlanRepository for MemoryStore {
    async fn find_subscription(&self, user_id: &str) -> StoreResult<Option<Subscription>> {
        self.count_plan_query();
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|(s, _)| s.user_id == user_id)
            .max_by_key(|(_, seq)| *seq)
            .map(|(s, _)| Subscription {
                user_id: s.user_id.clone(),
                subscription_id: s.subscription_id.clone(),
                product_id: s.product_id.clone(),
                variant_id: s.variant_id.clone(),
                status: s.status.clone(),
            }))
    }

    async fn find_plan_by_variant(&self, variant_id: &str) -> StoreResult<Option<Plan>> {
        self.count_plan_query();
        let tables = self.tables.read().await;
        Ok(tables
            .plans
            .iter()
            .find(|p| p.variant_id.as_deref() == Some(variant_id))
            .cloned())
    }

    async fn find_plan_by_product(&self, product_id: &str) -> StoreResult<Option<Plan>> {
        self.count_plan_query();
        let tables = self.tables.read().await;
        Ok(tables
            .plans
            .iter()
            .find(|p| p.product_id.as_deref() == Some(product_id))
            .cloned())
    }

    async fn find_plan_by_slug(&self, slug: &str) -> StoreResult<Option<Plan>> {
        self.count_plan_query();
        let tables = self.tables.read().await;
        Ok(tables.plans.iter().find(|p| p.slug == slug).cloned())
    }
}

#[async_trait]
impl BillingRepository for MemoryStore {
    async fn record_webhook_event(&self, event_id: &str, _event_type: &str, _payload_hash: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.billing_events.contains_key(event_id) {
            return Ok(false);
        }
        tables
            .billing_events
            .insert(event_id.to_string(), "received".to_string());
        Ok(true)
    }

    async fn mark_webhook_event(&self, event_id: &str, status: &str, _error: Option<&str>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(current) = tables.billing_events.get_mut(event_id) {
            *current = status.to_string();
        }
        Ok(())
    }

    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.sequence += 1;
        let seq = tables.sequence;

        let existing = upsert.subscription_id.as_ref().and_then(|id| {
            tables
                .subscriptions
                .iter()
                .position(|(s, _)| s.subscription_id.as_ref() == Some(id))
        });
        match existing {
            Some(index) => tables.subscriptions[index] = (upsert.clone(), seq),
            None => tables.subscriptions.push((upsert.clone(), seq)),
        }
        Ok(())
    }
}

#[async_trait]
impl GithubRepository for MemoryStore {
    async fn find_github_settings(&self, user_id: &str) -> StoreResult<Option<GithubSettings>> {
        Ok(self.tables.read().await.github.get(user_id).cloned())
    }

    async fn disconnect_github(&self, user_id: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.github.remove(user_id).is_some();
        let updated = match tables.users.get_mut(user_id) {
            Some(user) => {
                user.github_connected = false;
                true
            }
            None => false,
        };
        Ok(removed || updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: format!("{}@example.com", id),
            username: None,
            github_connected: false,
            api_keys_count: 0,
            total_collections: 0,
            top_collections: vec![],
        }
    }

    fn new_collection(title: &str) -> NewCollection {
        NewCollection {
            title: title.to_string(),
            description: String::new(),
            visibility: "private".to_string(),
        }
    }

    #[tokio::test]
    async fn link_counters_track_inserts_and_deletes() {
        let store = MemoryStore::new();
        store.insert_user(user("u1")).await;
        let collection = store.create_collection("u1", &new_collection("Reading")).await.unwrap();

        let new = NewLink {
            user_id: "u1".into(),
            collection_id: collection.id,
            title: "Rust".into(),
            url: "https://rust-lang.org".into(),
        };
        let (first, total) = store.insert_link(&new).await.unwrap();
        assert_eq!(total, 1);
        let (_, total) = store.insert_link(&new).await.unwrap();
        assert_eq!(total, 2);

        assert!(store.delete_link("u1", first.id).await.unwrap().is_some());
        assert_eq!(store.collection(collection.id).await.unwrap().total_links, 1);
        assert!(store.delete_link("u1", first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_collection_unpins_it() {
        let store = MemoryStore::new();
        store.insert_user(user("u1")).await;
        let collection = store.create_collection("u1", &new_collection("Pinned")).await.unwrap();
        store.set_top_collections("u1", &[collection.id]).await.unwrap();

        assert!(store.delete_collection("u1", collection.id).await.unwrap());

        let user = store.find_user("u1").await.unwrap().unwrap();
        assert!(user.top_collections.is_empty());
        assert_eq!(user.total_collections, 0);
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        store.insert_user(user("u1")).await;
        store.insert_user(user("u2")).await;

        store.set_username("u1", "ada").await.unwrap();
        let err = store.set_username("u2", "ada").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn webhook_events_are_recorded_once() {
        let store = MemoryStore::new();
        assert!(store.record_webhook_event("evt_1", "subscription_created", "h").await.unwrap());
        assert!(!store.record_webhook_event("evt_1", "subscription_created", "h").await.unwrap());
    }
}
