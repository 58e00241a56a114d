use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use cur8t_backend::{
    AppState,
    cache::{RedisCache, RedisCounterStore},
    config::Config,
    database::PgStore,
    github::ReqwestGithub,
    ratelimit::{LimiterTable, RateLimiter},
    routes,
    subscription::SnapshotProvider,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'cur8t_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let redis = Arc::new(
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client"),
    );

    let store = Arc::new(PgStore::new(pool));
    let limiter = RateLimiter::new(
        Arc::new(RedisCounterStore::new(redis.clone())),
        LimiterTable::standard(),
        config.rate_limit_failure_policy,
    );
    tracing::info!(
        "Loaded {} rate limiters, counter store failure policy {:?}",
        limiter.table().len(),
        limiter.policy()
    );
    let snapshots = SnapshotProvider::new(
        store.clone(),
        Arc::new(RedisCache::new(redis)),
        config.subscription_cache_ttl(),
    );

    let state = AppState {
        config: config.clone(),
        store,
        limiter: Arc::new(limiter),
        snapshots: Arc::new(snapshots),
        github: Arc::new(ReqwestGithub::new(config.github_api_base.clone())),
    };

    let router = routes::router(state);

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
