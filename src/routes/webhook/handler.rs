use axum::{body::Bytes, extract::State, http::HeaderMap};
use uuid::Uuid;

use crate::{
    AppState,
    database::BillingRepository,
    error::AppError,
    ratelimit::{LimiterName, resolve_identifier},
    result::{ActionResult, ApiResult},
    utils::{sha256_hex, verify_webhook_signature},
};

use super::model::{SIGNATURE_HEADER, WebhookAck, WebhookPayload};

/// Billing provider callback. Each event id is applied at most once; a
/// subscription change also drops the user's cached plan snapshot.
#[axum::debug_handler]
pub async fn billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ActionResult<WebhookAck> {
    let identifier = resolve_identifier(None, &headers);
    state
        .limiter
        .enforce(
            LimiterName::BillingWebhook,
            &identifier,
            "Too many webhook deliveries. Please try again later.",
        )
        .await?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if !verify_webhook_signature(&state.config.billing_webhook_secret, &body, signature) {
        tracing::warn!("Rejected billing webhook with invalid signature");
        return Err(AppError::Unauthorized("Invalid signature".to_string()));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Unparsable billing webhook: {}", e);
        AppError::Validation("Invalid payload".to_string())
    })?;

    let event_id = payload
        .event_id()
        .unwrap_or_else(|| format!("fallback-{}", Uuid::new_v4()));
    let recorded = state
        .store
        .record_webhook_event(&event_id, payload.event_name(), &sha256_hex(&body))
        .await?;
    if !recorded {
        tracing::info!("Duplicate billing event {}, skipping", event_id);
        return Ok(ApiResult::success(WebhookAck {
            received: true,
            duplicate: true,
        }));
    }

    let Some(upsert) = payload.subscription_upsert() else {
        tracing::debug!("Billing event {} has no subscription change", event_id);
        state
            .store
            .mark_webhook_event(&event_id, "ignored", None)
            .await?;
        return Ok(ApiResult::success(WebhookAck {
            received: true,
            duplicate: false,
        }));
    };

    if let Err(e) = state.store.upsert_subscription(&upsert).await {
        let message = e.to_string();
        state
            .store
            .mark_webhook_event(&event_id, "failed", Some(&message))
            .await?;
        return Err(e.into());
    }

    state.snapshots.invalidate(&upsert.user_id).await;
    state
        .store
        .mark_webhook_event(&event_id, "processed", None)
        .await?;
    tracing::info!(
        "Subscription for {} is now {} (event {})",
        upsert.user_id,
        upsert.status,
        event_id
    );

    Ok(ApiResult::success(WebhookAck {
        received: true,
        duplicate: false,
    }))
}
