use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    ratelimit::{LimiterName, client_address},
};

/// The limiter guarding one anonymous route.
#[derive(Clone)]
pub struct RouteLimit {
    state: AppState,
    name: LimiterName,
    message: &'static str,
}

impl RouteLimit {
    pub fn new(state: AppState, name: LimiterName, message: &'static str) -> Self {
        Self {
            state,
            name,
            message,
        }
    }
}

/// Charges an anonymous request to its route's limiter, keyed by client
/// address, and reports the remaining budget on the response.
pub async fn anonymous_rate_limit(
    State(limit): State<RouteLimit>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_address(req.headers());
    let outcome = limit
        .state
        .limiter
        .enforce(limit.name, &ip, limit.message)
        .await?;

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(outcome.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(outcome.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(outcome.reset));
    Ok(response)
}
