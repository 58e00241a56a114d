use std::collections::HashSet;

use axum::{
    Extension,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::HeaderMap,
};
use uuid::Uuid;

use crate::{
    AppState,
    database::{CollectionRepository, UserRepository, models::{Collection, NewCollection}},
    error::AppError,
    ratelimit::LimiterName,
    result::{ActionResult, ApiResult},
    routes::common::{
        Deleted, caller_id, json_body, optional_text, query_params, quota_exceeded, required_text,
    },
    utils::Claims,
};

use super::model::{
    CreateCollectionRequest, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, PublicCollectionsQuery,
    RenameCollectionRequest, TopCollectionsRequest, TopCollectionsResponse, VisibilityRequest,
    parse_visibility,
};

fn not_found() -> AppError {
    AppError::NotFound("Collection not found".to_string())
}

#[axum::debug_handler]
pub async fn create_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    payload: Result<Json<CreateCollectionRequest>, JsonRejection>,
) -> ActionResult<Collection> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::CreateCollection,
            &identifier,
            "Too many collections created. Please try again later.",
        )
        .await?;

    let req = json_body(payload)?;
    let title = required_text(&req.title, "Collection name", MAX_TITLE_LEN)?;
    let description = optional_text(req.description.as_deref(), "Description", MAX_DESCRIPTION_LEN)?;
    let visibility = parse_visibility(req.visibility.as_deref().unwrap_or("private"))?;

    let snapshot = state.snapshots.snapshot(&claims.sub).await;
    let current = state.store.count_collections(&claims.sub).await?;
    if current >= snapshot.limits.collections {
        return Err(quota_exceeded(
            &snapshot,
            format!(
                "You have {} collections. Your plan allows up to {}.",
                current, snapshot.limits.collections
            ),
        ));
    }

    let collection = state
        .store
        .create_collection(
            &claims.sub,
            &NewCollection {
                title,
                description,
                visibility,
            },
        )
        .await?;
    tracing::info!("Collection {} created by {}", collection.id, claims.sub);

    Ok(ApiResult::success(collection))
}

#[axum::debug_handler]
pub async fn list_collections(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ActionResult<Vec<Collection>> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GetCollections,
            &identifier,
            "Too many requests to fetch collections. Please try again later.",
        )
        .await?;

    let collections = state.store.list_collections(&claims.sub).await?;
    Ok(ApiResult::success(collections))
}

#[axum::debug_handler]
pub async fn get_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ActionResult<Collection> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GetCollection,
            &identifier,
            "Too many requests to fetch this collection. Please try again later.",
        )
        .await?;

    let collection = state
        .store
        .find_collection(&claims.sub, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResult::success(collection))
}

#[axum::debug_handler]
pub async fn rename_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<RenameCollectionRequest>, JsonRejection>,
) -> ActionResult<Collection> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::ChangeCollectionName,
            &identifier,
            "Too many requests to rename collections. Please try again later.",
        )
        .await?;

    let req = json_body(payload)?;
    let title = required_text(&req.title, "Collection name", MAX_TITLE_LEN)?;

    let collection = state
        .store
        .rename_collection(&claims.sub, id, &title)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResult::success(collection))
}

#[axum::debug_handler]
pub async fn change_visibility(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    payload: Result<Json<VisibilityRequest>, JsonRejection>,
) -> ActionResult<Collection> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::ChangeCollectionVisibility,
            &identifier,
            "Too many requests to change collection visibility. Please try again later.",
        )
        .await?;

    let req = json_body(payload)?;
    let visibility = parse_visibility(&req.visibility)?;

    let collection = state
        .store
        .set_visibility(&claims.sub, id, &visibility)
        .await?
        .ok_or_else(not_found)?;
    Ok(ApiResult::success(collection))
}

#[axum::debug_handler]
pub async fn delete_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ActionResult<Deleted> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::DeleteCollection,
            &identifier,
            "Too many collections deleted. Please try again later.",
        )
        .await?;

    if !state.store.delete_collection(&claims.sub, id).await? {
        return Err(not_found());
    }
    tracing::info!("Collection {} deleted by {}", id, claims.sub);

    Ok(ApiResult::success(Deleted { id }))
}

#[axum::debug_handler]
pub async fn update_top_collections(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    payload: Result<Json<TopCollectionsRequest>, JsonRejection>,
) -> ActionResult<TopCollectionsResponse> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::UpdateTopCollections,
            &identifier,
            "Too many requests to update top collections. Please try again later.",
        )
        .await?;

    let req = json_body(payload)?;
    let ids = req.collection_ids;
    let unique: HashSet<_> = ids.iter().collect();
    if unique.len() != ids.len() {
        return Err(AppError::Validation(
            "A collection can only be pinned once".to_string(),
        ));
    }

    let snapshot = state.snapshots.snapshot(&claims.sub).await;
    let max = snapshot.limits.top_collections;
    if ids.len() as i64 > max {
        return Err(quota_exceeded(
            &snapshot,
            format!("You can pin up to {} collections on your plan.", max),
        ));
    }

    if state.store.count_owned_collections(&claims.sub, &ids).await? != ids.len() as i64 {
        return Err(AppError::Forbidden(
            "One or more collections do not belong to you".to_string(),
        ));
    }

    let user = state
        .store
        .set_top_collections(&claims.sub, &ids)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ApiResult::success(TopCollectionsResponse {
        top_collections: user.top_collections,
    }))
}

/// Anonymous listing. Rate limited per client address by the route layer.
#[axum::debug_handler]
pub async fn list_public_collections(
    State(state): State<AppState>,
    query: Result<Query<PublicCollectionsQuery>, QueryRejection>,
) -> ActionResult<Vec<Collection>> {
    let (limit, offset) = query_params(query)?.page()?;
    let collections = state.store.list_public_collections(limit, offset).await?;
    Ok(ApiResult::success(collections))
}
