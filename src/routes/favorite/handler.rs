use axum::{
    Extension,
    extract::{Json, Path, State, rejection::JsonRejection},
    http::HeaderMap,
};
use uuid::Uuid;

use crate::{
    AppState,
    database::{FavoriteRepository, StoreError, models::Favorite},
    error::AppError,
    ratelimit::LimiterName,
    result::{ActionResult, ApiResult},
    routes::common::{Deleted, caller_id, json_body, quota_exceeded, required_text, web_url},
    utils::Claims,
};

use super::model::{FavoriteRequest, MAX_FAVORITE_TITLE_LEN};

fn validated(req: &FavoriteRequest) -> Result<(String, String), AppError> {
    web_url(&req.url)?;
    let title = required_text(&req.title, "Title", MAX_FAVORITE_TITLE_LEN)?;
    Ok((title, req.url.trim().to_string()))
}

fn duplicate_url(e: StoreError) -> AppError {
    match e {
        StoreError::Conflict(_) => {
            AppError::Conflict("This URL is already in your favorites".to_string())
        }
        other => other.into(),
    }
}

#[axum::debug_handler]
pub async fn create_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    payload: Result<Json<FavoriteRequest>, JsonRejection>,
) -> ActionResult<Favorite> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::CreateFavorite,
            &identifier,
            "Too many requests to create favorites. Please try again later.",
        )
        .await?;

    let (title, url) = validated(&json_body(payload)?)?;

    let snapshot = state.snapshots.snapshot(&claims.sub).await;
    let current = state.store.count_favorites(&claims.sub).await?;
    if current >= snapshot.limits.favorites {
        return Err(quota_exceeded(
            &snapshot,
            format!(
                "You have {} favorites. Your plan allows up to {}.",
                current, snapshot.limits.favorites
            ),
        ));
    }

    let favorite = state
        .store
        .create_favorite(&claims.sub, &title, &url)
        .await
        .map_err(duplicate_url)?;
    Ok(ApiResult::success(favorite))
}

#[axum::debug_handler]
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ActionResult<Vec<Favorite>> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GetFavorites,
            &identifier,
            "Too many requests to fetch favorites. Please try again later.",
        )
        .await?;

    Ok(ApiResult::success(state.store.list_favorites(&claims.sub).await?))
}

#[axum::debug_handler]
pub async fn update_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<FavoriteRequest>, JsonRejection>,
) -> ActionResult<Favorite> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::UpdateFavorite,
            &identifier,
            "Too many requests to update favorites. Please try again later.",
        )
        .await?;

    let (title, url) = validated(&json_body(payload)?)?;

    let favorite = state
        .store
        .update_favorite(&claims.sub, id, &title, &url)
        .await
        .map_err(duplicate_url)?
        .ok_or_else(|| AppError::NotFound("Favorite not found".to_string()))?;
    Ok(ApiResult::success(favorite))
}

#[axum::debug_handler]
pub async fn delete_favorite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ActionResult<Deleted> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::DeleteFavorite,
            &identifier,
            "Too many requests to delete favorites. Please try again later.",
        )
        .await?;

    if !state.store.delete_favorite(&claims.sub, id).await? {
        return Err(AppError::NotFound("Favorite not found".to_string()));
    }
    Ok(ApiResult::success(Deleted { id }))
}
