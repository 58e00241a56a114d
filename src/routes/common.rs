use axum::{
    Json,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::HeaderMap,
};
use reqwest::Url;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    ratelimit::resolve_identifier,
    subscription::SubscriptionSnapshot,
    utils::Claims,
};

pub const MAX_URL_LEN: usize = 2048;

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: Uuid,
}

/// Rate-limit identifier of an authenticated caller.
pub fn caller_id(claims: &Claims, headers: &HeaderMap) -> String {
    resolve_identifier(Some(&claims.sub), headers)
}

/// Unwraps a JSON body once the rate limit has been checked.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(AppError::from)
}

/// Unwraps query parameters, reporting a malformed query string as a
/// validation error.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query.map(|Query(params)| params).map_err(AppError::from)
}

/// Trims `value` and checks it is non-empty and at most `max` characters.
pub fn required_text(value: &str, field: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

pub fn optional_text(value: Option<&str>, field: &str, max: usize) -> Result<String, AppError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Accepts absolute http(s) URLs only.
pub fn web_url(raw: &str) -> Result<Url, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("URL is required".to_string()));
    }
    if raw.len() > MAX_URL_LEN {
        return Err(AppError::Validation(format!(
            "URL must be at most {} characters",
            MAX_URL_LEN
        )));
    }

    let url = Url::parse(raw).map_err(|_| AppError::Validation("Invalid URL format".to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(AppError::Validation("Invalid URL format".to_string())),
    }
}

pub fn quota_exceeded(snapshot: &SubscriptionSnapshot, message: String) -> AppError {
    AppError::QuotaExceeded {
        message,
        plan: snapshot.plan_slug.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_must_be_http() {
        assert!(web_url("https://example.com/a").is_ok());
        assert!(web_url(" http://example.com ").is_ok());
        assert!(web_url("ftp://example.com").is_err());
        assert!(web_url("javascript:alert(1)").is_err());
        assert!(web_url("example.com").is_err());
        assert!(web_url(&format!("https://example.com/{}", "a".repeat(MAX_URL_LEN))).is_err());
    }

    #[test]
    fn text_is_trimmed_and_bounded() {
        assert_eq!(required_text("  Rust ", "Title", 10).unwrap(), "Rust");
        assert!(required_text("   ", "Title", 10).is_err());
        assert!(required_text("abcdefghijk", "Title", 10).is_err());
        assert_eq!(optional_text(None, "Description", 5).unwrap(), "");
    }
}
