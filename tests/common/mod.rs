#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use cur8t_backend::{
    AppState,
    cache::{MemoryCache, MemoryCounterStore},
    config::Config,
    database::{
        CollectionRepository, LinkRepository, MemoryStore,
        models::{Collection, NewCollection, NewLink, Plan, User},
    },
    github::{GithubApi, GithubError, RemoteFile, Repo},
    ratelimit::{FailurePolicy, LimiterTable, ManualClock, RateLimiter},
    routes,
    subscription::SnapshotProvider,
    utils::Claims,
};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";
pub const START_MILLIS: u64 = 1_700_000_000_000;

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        redis_url: "redis://unused".into(),
        server_host: "127.0.0.1".into(),
        server_port: 0,
        api_base_uri: "/api".into(),
        auth_jwt_secret: JWT_SECRET.into(),
        api_key_pepper: "pepper".into(),
        billing_webhook_secret: WEBHOOK_SECRET.into(),
        github_api_base: "http://github.invalid".into(),
        github_repo_name: "bookmarksCollection".into(),
        rate_limit_failure_policy: FailurePolicy::FailOpen,
        subscription_cache_ttl_secs: 300,
    }
}

/// GitHub is never reachable from tests.
pub struct OfflineGithub;

#[async_trait]
impl GithubApi for OfflineGithub {
    async fn authenticated_login(&self, _token: &str) -> Result<String, GithubError> {
        Err(GithubError::Decode("offline".into()))
    }

    async fn ensure_repo(&self, _repo: Repo<'_>) -> Result<(), GithubError> {
        Err(GithubError::Decode("offline".into()))
    }

    async fn file_content(&self, _repo: Repo<'_>, _path: &str) -> Result<Option<RemoteFile>, GithubError> {
        Err(GithubError::Decode("offline".into()))
    }

    async fn put_file(
        &self,
        _repo: Repo<'_>,
        _path: &str,
        _content: &str,
        _sha: Option<&str>,
        _message: &str,
    ) -> Result<(), GithubError> {
        Err(GithubError::Decode("offline".into()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub clock: Arc<ManualClock>,
    pub snapshots: Arc<SnapshotProvider>,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_table(LimiterTable::standard())
    }

    pub fn with_table(table: LimiterTable) -> Self {
        Self::build(MemoryStore::new(), table)
    }

    /// Backed by the plan catalog a migrated database starts with.
    pub fn seeded() -> Self {
        Self::build(MemoryStore::seeded(), LimiterTable::standard())
    }

    fn build(store: MemoryStore, table: LimiterTable) -> Self {
        let store = Arc::new(store);
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let cache = Arc::new(MemoryCache::with_clock(clock.clone()));
        let limiter = RateLimiter::new(
            Arc::new(MemoryCounterStore::new()),
            table,
            FailurePolicy::FailOpen,
        )
        .with_clock(clock.clone());
        let snapshots = Arc::new(SnapshotProvider::new(
            store.clone(),
            cache.clone(),
            Duration::from_secs(300),
        ));

        let state = AppState {
            config: test_config(),
            store: store.clone(),
            limiter: Arc::new(limiter),
            snapshots: snapshots.clone(),
            github: Arc::new(OfflineGithub),
        };

        Self {
            router: routes::router(state),
            store,
            cache,
            clock,
            snapshots,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        Reply {
            status,
            headers,
            body,
        }
    }

    /// Authenticated JSON request as `user_id`.
    pub async fn call(&self, method: Method, path: &str, user_id: &str, body: Option<Value>) -> Reply {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("/api{}", path))
            .header("authorization", format!("Bearer {}", token(user_id)))
            .header("x-forwarded-for", "203.0.113.7");
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn anonymous_get(&self, path: &str, ip: &str) -> Reply {
        let request = Request::builder()
            .uri(format!("/api{}", path))
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn seed_user(&self, id: &str) {
        self.store.insert_user(user(id)).await;
    }

    pub async fn seed_collection(&self, user_id: &str, title: &str) -> Collection {
        self.store
            .create_collection(
                user_id,
                &NewCollection {
                    title: title.to_string(),
                    description: String::new(),
                    visibility: "private".to_string(),
                },
            )
            .await
            .unwrap()
    }

    pub async fn seed_links(&self, user_id: &str, collection_id: Uuid, count: usize) {
        for i in 0..count {
            self.store
                .insert_link(&NewLink {
                    user_id: user_id.to_string(),
                    collection_id,
                    title: format!("Link {}", i),
                    url: format!("https://example.com/{}", i),
                })
                .await
                .unwrap();
        }
    }
}

pub fn token(user_id: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@example.com", id),
        username: None,
        github_connected: false,
        api_keys_count: 0,
        total_collections: 0,
        top_collections: vec![],
    }
}

pub fn plan(slug: &str, variant_id: Option<&str>, limits: Value) -> Plan {
    Plan {
        id: Uuid::new_v4(),
        name: slug.to_uppercase(),
        slug: slug.to_string(),
        product_id: None,
        variant_id: variant_id.map(str::to_string),
        interval: if slug == "free" { "none".into() } else { "month".into() },
        price_cents: if slug == "free" { 0 } else { 900 },
        limits,
    }
}

pub fn limits(collections: i64, per_collection: i64, total: i64, favorites: i64, top: i64) -> Value {
    json!({
        "collections": collections,
        "linksPerCollection": per_collection,
        "totalLinks": total,
        "favorites": favorites,
        "topCollections": top,
    })
}
