use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_config::AppConfig;
use shared_models::error::ApiError;

use crate::jwt::validate_token;

/// Middleware that verifies the bearer token and attaches the caller's
/// identity to the request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Auth("Authentication token is required".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| ApiError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(ApiError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    let user = validate_token(token, &config.jwt_secret).map_err(ApiError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
