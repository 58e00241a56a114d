use axum::{
    Extension,
    extract::{Json, Path, State, rejection::JsonRejection},
    http::HeaderMap,
};
use uuid::Uuid;

use crate::{
    AppState,
    database::{ApiKeyRepository, models::ApiKey},
    error::AppError,
    ratelimit::LimiterName,
    result::{ActionResult, ApiResult},
    routes::common::{Deleted, caller_id, json_body, required_text},
    utils::{Claims, api_key_display_prefix, generate_api_key, hash_api_key},
};

use super::model::{CreateApiKeyRequest, CreatedApiKey, MAX_API_KEYS, MAX_KEY_NAME_LEN};

#[axum::debug_handler]
pub async fn create_api_key(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    payload: Result<Json<CreateApiKeyRequest>, JsonRejection>,
) -> ActionResult<CreatedApiKey> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::CreateApiKey,
            &identifier,
            "Too many API key creation attempts. Please try again later.",
        )
        .await?;

    let req = json_body(payload)?;
    let name = required_text(&req.name, "Name", MAX_KEY_NAME_LEN)?;

    if state.store.count_api_keys(&claims.sub).await? >= MAX_API_KEYS {
        return Err(AppError::Forbidden(
            "You have reached the maximum number of API keys".to_string(),
        ));
    }

    let secret = generate_api_key();
    let key_hash = hash_api_key(&state.config.api_key_pepper, &secret);
    let key = state
        .store
        .create_api_key(&claims.sub, &name, &key_hash, &api_key_display_prefix(&secret))
        .await?;
    tracing::info!("API key {} created for {}", key.id, claims.sub);

    Ok(ApiResult::success(CreatedApiKey { key, secret }))
}

#[axum::debug_handler]
pub async fn list_api_keys(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ActionResult<Vec<ApiKey>> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::GetApiKeys,
            &identifier,
            "Too many requests to fetch API keys. Please try again later.",
        )
        .await?;

    Ok(ApiResult::success(state.store.list_api_keys(&claims.sub).await?))
}

#[axum::debug_handler]
pub async fn delete_api_key(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ActionResult<Deleted> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::DeleteApiKey,
            &identifier,
            "Too many API key deletion attempts. Please try again later.",
        )
        .await?;

    if !state.store.delete_api_key(&claims.sub, id).await? {
        return Err(AppError::NotFound("API key not found".to_string()));
    }
    tracing::info!("API key {} revoked for {}", id, claims.sub);

    Ok(ApiResult::success(Deleted { id }))
}
