use axum::extract::{Path, State};

use crate::{
    AppState,
    database::{CollectionRepository, UserRepository},
    error::AppError,
    result::{ActionResult, ApiResult},
};

use super::model::PublicProfile;

/// Rate limited per client address by the route layer.
#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ActionResult<PublicProfile> {
    let user = state
        .store
        .find_user_by_username(username.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let collections = state.store.list_public_collections_by_user(&user.id).await?;

    Ok(ApiResult::success(PublicProfile::new(user, collections)))
}
