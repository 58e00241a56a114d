use axum::{
    Extension,
    extract::{Json, Path, State, rejection::JsonRejection},
    http::HeaderMap,
};
use uuid::Uuid;

use crate::{
    AppState,
    database::{CollectionRepository, LinkRepository, models::{Link, NewLink}},
    error::AppError,
    ratelimit::LimiterName,
    result::{ActionResult, ApiResult},
    routes::common::{Deleted, caller_id, json_body, optional_text, quota_exceeded, web_url},
    utils::Claims,
};

use super::model::{CreateLinkRequest, CreatedLink, MAX_LINK_TITLE_LEN};

#[axum::debug_handler]
pub async fn create_link(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(collection_id): Path<Uuid>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> ActionResult<CreatedLink> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::CreateLink,
            &identifier,
            "Too many requests to create link. Please try again later.",
        )
        .await?;

    let req = json_body(payload)?;
    let url = web_url(&req.url)?;
    let mut title = optional_text(req.title.as_deref(), "Title", MAX_LINK_TITLE_LEN)?;
    if title.is_empty() {
        title = url.host_str().unwrap_or_default().to_string();
    }

    if state
        .store
        .find_collection(&claims.sub, collection_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Collection not found".to_string()));
    }

    let snapshot = state.snapshots.snapshot(&claims.sub).await;
    let per_collection_max = snapshot.limits.links_per_collection;
    let total_max = snapshot.limits.total_links;

    let in_collection = state
        .store
        .count_links_in_collection(&claims.sub, collection_id)
        .await?;
    if in_collection >= per_collection_max {
        return Err(quota_exceeded(
            &snapshot,
            format!(
                "This collection already has {} links. Your plan allows {} per collection.",
                in_collection, per_collection_max
            ),
        ));
    }

    let overall = state.store.count_links(&claims.sub).await?;
    if overall >= total_max {
        return Err(quota_exceeded(
            &snapshot,
            format!(
                "You have {} total links. Your plan allows up to {}.",
                overall, total_max
            ),
        ));
    }

    let (link, collection_total_links) = state
        .store
        .insert_link(&NewLink {
            user_id: claims.sub.clone(),
            collection_id,
            title,
            url: req.url.trim().to_string(),
        })
        .await?;
    tracing::debug!("Link {} added to collection {}", link.id, collection_id);

    Ok(ApiResult::success(CreatedLink {
        link,
        collection_total_links,
    }))
}

#[axum::debug_handler]
pub async fn list_links(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(collection_id): Path<Uuid>,
) -> ActionResult<Vec<Link>> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GetLinks,
            &identifier,
            "Too many requests to fetch links. Please try again later.",
        )
        .await?;

    let links = state.store.list_links(&claims.sub, collection_id).await?;
    Ok(ApiResult::success(links))
}

#[axum::debug_handler]
pub async fn delete_link(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ActionResult<Deleted> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::DeleteLink,
            &identifier,
            "Too many requests to delete links. Please try again later.",
        )
        .await?;

    state
        .store
        .delete_link(&claims.sub, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Link not found".to_string()))?;

    Ok(ApiResult::success(Deleted { id }))
}
