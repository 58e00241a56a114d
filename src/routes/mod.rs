use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    middleware::{RouteLimit, anonymous_rate_limit, auth_middleware, log_errors},
    ratelimit::LimiterName,
};

pub mod api_key;
pub mod collection;
pub mod common;
pub mod favorite;
pub mod github;
pub mod link;
pub mod profile;
pub mod subscription;
pub mod user;
pub mod webhook;

/// All routes nested under `config.api_base_uri`.
pub fn router(state: AppState) -> Router {
    // Anonymous endpoints, each charged to its own limiter per client address.
    let public_routes = Router::new()
        .route(
            "/collections/public",
            get(collection::list_public_collections).layer(from_fn_with_state(
                RouteLimit::new(
                    state.clone(),
                    LimiterName::FetchPublicCollections,
                    "Too many requests to fetch public collections. Please try again later.",
                ),
                anonymous_rate_limit,
            )),
        )
        .route(
            "/profile/{username}",
            get(profile::get_profile).layer(from_fn_with_state(
                RouteLimit::new(
                    state.clone(),
                    LimiterName::ProfileRead,
                    "Too many profile requests. Please try again later.",
                ),
                anonymous_rate_limit,
            )),
        );

    // Signed by the billing provider; limited by its own budget.
    let webhook_routes = Router::new().route("/webhooks/billing", post(webhook::billing_webhook));

    let protected_routes = Router::new()
        .route("/user/info", get(user::get_user_info))
        .route("/user/usage", get(user::get_usage))
        .route("/user/username", put(user::update_username))
        .route(
            "/subscription/status",
            get(subscription::get_subscription_status),
        )
        .route(
            "/collections",
            get(collection::list_collections).post(collection::create_collection),
        )
        .route("/collections/top", put(collection::update_top_collections))
        .route(
            "/collections/{id}",
            get(collection::get_collection).delete(collection::delete_collection),
        )
        .route("/collections/{id}/name", put(collection::rename_collection))
        .route(
            "/collections/{id}/visibility",
            put(collection::change_visibility),
        )
        .route(
            "/collections/{id}/links",
            get(link::list_links).post(link::create_link),
        )
        .route("/links/{id}", delete(link::delete_link))
        .route(
            "/favorites",
            get(favorite::list_favorites).post(favorite::create_favorite),
        )
        .route(
            "/favorites/{id}",
            put(favorite::update_favorite).delete(favorite::delete_favorite),
        )
        .route(
            "/api-keys",
            get(api_key::list_api_keys).post(api_key::create_api_key),
        )
        .route("/api-keys/{id}", delete(api_key::delete_api_key))
        .route("/github/status", get(github::get_github_status))
        .route("/github/sync", post(github::sync_github))
        .route("/github/disconnect", post(github::disconnect_github))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest(
            &state.config.api_base_uri,
            Router::new()
                .merge(public_routes)
                .merge(webhook_routes)
                .merge(protected_routes),
        )
        .layer(from_fn(log_errors))
        .with_state(state)
}
