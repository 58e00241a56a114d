use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::database::StoreError;
use crate::ratelimit::RateLimitOutcome;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{message}")]
    RateLimited {
        message: String,
        limit: u32,
        remaining: u32,
        reset: u64,
        retry_after: u64,
    },
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    QuotaExceeded { message: String, plan: String },
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error")]
    InternalServerError,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plan: Option<String>,
}

impl From<RateLimitOutcome> for AppError {
    fn from(outcome: RateLimitOutcome) -> Self {
        AppError::RateLimited {
            message: outcome
                .error
                .unwrap_or_else(|| "Rate limit exceeded".to_string()),
            limit: outcome.limit,
            remaining: outcome.remaining,
            reset: outcome.reset,
            retry_after: outcome.retry_after.unwrap_or(60),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(message) => AppError::Conflict(message),
            other => {
                tracing::error!("Database error: {}", other);
                AppError::InternalServerError
            }
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::QuotaExceeded { .. } | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn header(value: impl ToString) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut headers = HeaderMap::new();

        let body = match self {
            AppError::RateLimited {
                message,
                limit,
                remaining,
                reset,
                retry_after,
            } => {
                headers.insert("retry-after", header(retry_after));
                headers.insert("x-ratelimit-limit", header(limit));
                headers.insert("x-ratelimit-remaining", header(remaining));
                headers.insert("x-ratelimit-reset", header(reset));
                ErrorResponse {
                    error: message,
                    retry_after: Some(retry_after),
                    plan: None,
                }
            }
            AppError::QuotaExceeded { message, plan } => ErrorResponse {
                error: message,
                retry_after: None,
                plan: Some(plan),
            },
            other => ErrorResponse {
                error: other.to_string(),
                retry_after: None,
                plan: None,
            },
        };

        (status, headers, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn rate_limited_sets_headers_and_body() {
        let response = AppError::RateLimited {
            message: "Too many".into(),
            limit: 3,
            remaining: 0,
            reset: 1_000,
            retry_after: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "42");
        assert_eq!(response.headers()["x-ratelimit-limit"], "3");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");

        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Too many");
        assert_eq!(json["retryAfter"], 42);
    }

    #[tokio::test]
    async fn quota_error_names_the_plan() {
        let response = AppError::QuotaExceeded {
            message: "full".into(),
            plan: "free".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "full", "plan": "free" }));
    }

    #[test]
    fn unique_violations_become_conflicts() {
        let err = AppError::from(StoreError::Conflict("Username already taken".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Username already taken");
    }
}
