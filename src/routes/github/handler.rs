use axum::{Extension, extract::State, http::HeaderMap};

use crate::{
    AppState,
    database::{CollectionRepository, GithubRepository, LinkRepository, UserRepository},
    error::AppError,
    github::{SyncReport, sync_collections},
    ratelimit::LimiterName,
    result::{ActionResult, ApiResult},
    routes::common::caller_id,
    utils::Claims,
};

use super::model::{Disconnected, GithubStatus};

#[axum::debug_handler]
pub async fn get_github_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ActionResult<GithubStatus> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GithubStatus,
            &identifier,
            "Too many requests to GitHub status. Please try again later.",
        )
        .await?;

    let user = state
        .store
        .find_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found in the database".to_string()))?;
    let settings = state.store.find_github_settings(&claims.sub).await?;

    Ok(ApiResult::success(GithubStatus {
        github_connected: user.github_connected,
        repo_name: settings.map(|s| {
            s.repo_name
                .unwrap_or_else(|| state.config.github_repo_name.clone())
        }),
    }))
}

#[axum::debug_handler]
pub async fn sync_github(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ActionResult<SyncReport> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GithubSync,
            &identifier,
            "Too many GitHub sync requests. Please try again later.",
        )
        .await?;

    let settings = state
        .store
        .find_github_settings(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Validation("GitHub not connected".to_string()))?;

    let mut collections = Vec::new();
    for collection in state.store.list_collections(&claims.sub).await? {
        let links = state.store.list_links(&claims.sub, collection.id).await?;
        collections.push((collection, links));
    }

    let repo_name = settings
        .repo_name
        .as_deref()
        .unwrap_or(&state.config.github_repo_name);
    let report = sync_collections(
        state.github.as_ref(),
        &settings.github_access_token,
        repo_name,
        &collections,
    )
    .await
    .map_err(|e| {
        tracing::error!("GitHub sync failed for {}: {}", claims.sub, e);
        AppError::InternalServerError
    })?;

    Ok(ApiResult::success(report))
}

#[axum::debug_handler]
pub async fn disconnect_github(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ActionResult<Disconnected> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GithubDisconnect,
            &identifier,
            "Too many requests to disconnect GitHub. Please try again later.",
        )
        .await?;

    if !state.store.disconnect_github(&claims.sub).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    tracing::info!("GitHub disconnected for {}", claims.sub);

    Ok(ApiResult::success(Disconnected { disconnected: true }))
}
