use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::AuthUser;
use shared_models::error::ApiError;

use crate::models::{AuthError, LoginRequest, RegisterRequest};
use crate::services::account::AccountService;

fn map_auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::EmailTaken => ApiError::Conflict("Email already registered".to_string()),
        AuthError::InvalidCredentials => ApiError::Auth("Invalid email or password".to_string()),
        AuthError::ValidationError(msg) => ApiError::ValidationError(msg),
        AuthError::TokenError(msg) => ApiError::Internal(msg),
        AuthError::DatabaseError(msg) => ApiError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn register(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let service = AccountService::new(&config);

    let (profile, token) = service.register(request).await.map_err(map_auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful",
            "token": token,
            "user": profile
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let service = AccountService::new(&config);

    let (profile, token) = service.login(request).await.map_err(map_auth_error)?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": profile
    })))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    debug!("Getting profile for user: {}", user.id);

    let service = AccountService::new(&config);

    let profile = service.get_profile(&user).await.map_err(map_auth_error)?;

    Ok(Json(json!({ "user": profile })))
}
