use axum::{
    Extension,
    extract::{Json, State, rejection::JsonRejection},
    http::HeaderMap,
};

use crate::{
    AppState,
    database::{
        ApiKeyRepository, CollectionRepository, FavoriteRepository, LinkRepository,
        UserRepository, models::User,
    },
    error::AppError,
    ratelimit::LimiterName,
    result::{ActionResult, ApiResult},
    routes::{api_key::MAX_API_KEYS, common::{caller_id, json_body}},
    utils::Claims,
};

use super::model::{Meter, UpdateUsernameRequest, Usage, validate_username};

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

#[axum::debug_handler]
pub async fn get_user_info(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ActionResult<User> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GetUserInfo,
            &identifier,
            "Too many requests to fetch user info. Please try again later.",
        )
        .await?;

    let user = state
        .store
        .find_user(&claims.sub)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(ApiResult::success(user))
}

/// Current counts next to the plan ceilings.
#[axum::debug_handler]
pub async fn get_usage(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ActionResult<Usage> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GetUsage,
            &identifier,
            "Too many requests to fetch usage. Please try again later.",
        )
        .await?;

    let user = state
        .store
        .find_user(&claims.sub)
        .await?
        .ok_or_else(user_not_found)?;
    let snapshot = state.snapshots.snapshot(&claims.sub).await;
    let limits = snapshot.limits;

    let usage = Usage {
        collections: Meter {
            used: state.store.count_collections(&claims.sub).await?,
            limit: limits.collections,
        },
        total_links: Meter {
            used: state.store.count_links(&claims.sub).await?,
            limit: limits.total_links,
        },
        favorites: Meter {
            used: state.store.count_favorites(&claims.sub).await?,
            limit: limits.favorites,
        },
        top_collections: Meter {
            used: user.top_collections.len() as i64,
            limit: limits.top_collections,
        },
        api_keys: Meter {
            used: state.store.count_api_keys(&claims.sub).await?,
            limit: MAX_API_KEYS,
        },
        plan: snapshot.plan_slug,
        plan_name: snapshot.plan_name,
    };
    Ok(ApiResult::success(usage))
}

#[axum::debug_handler]
pub async fn update_username(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    payload: Result<Json<UpdateUsernameRequest>, JsonRejection>,
) -> ActionResult<User> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::Username,
            &identifier,
            "Too many username changes. Please try again later.",
        )
        .await?;

    let req = json_body(payload)?;
    let username = validate_username(&req.username)?;

    if let Some(owner) = state.store.find_user_by_username(&username).await? {
        if owner.id != claims.sub {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
    }

    let user = state
        .store
        .set_username(&claims.sub, &username)
        .await?
        .ok_or_else(user_not_found)?;
    tracing::info!("User {} is now @{}", claims.sub, username);

    Ok(ApiResult::success(user))
}
