use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{AppState, error::AppError, utils::verify_token};

/// Verifies the bearer session token and exposes its claims to handlers as
/// `Extension<Claims>`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|e| {
        tracing::debug!("Missing or malformed authorization header: {}", e);
        AppError::Unauthorized("Unauthorized".to_string())
    })?;

    let claims = verify_token(bearer.token(), &state.config.auth_jwt_secret).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        AppError::Unauthorized("Unauthorized".to_string())
    })?;

    if claims.sub.is_empty() {
        return Err(AppError::Unauthorized("Unauthorized".to_string()));
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
