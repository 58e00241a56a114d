use axum::{Extension, extract::State, http::HeaderMap};

use crate::{
    AppState,
    ratelimit::LimiterName,
    result::{ActionResult, ApiResult},
    routes::common::caller_id,
    subscription::SubscriptionSnapshot,
    utils::Claims,
};

#[axum::debug_handler]
pub async fn get_subscription_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> ActionResult<SubscriptionSnapshot> {
    let identifier = caller_id(&claims, &headers);
    state
        .limiter
        .enforce(
            LimiterName::SubscriptionStatus,
            &identifier,
            "Too many requests to fetch subscription status. Please try again later.",
        )
        .await?;

    Ok(ApiResult::success(state.snapshots.snapshot(&claims.sub).await))
}
