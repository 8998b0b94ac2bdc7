use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extract::{JsonBody, WithRejection};
use shared_utils::jwt::validate_token as decode_token;

use crate::models::{LoginRequest, SignupRequest};
use crate::services::identity::IdentityService;

type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

fn bearer_token(header: BearerHeader) -> Result<String, AppError> {
    header
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string())
        .ok_or_else(|| AppError::Auth("Access token required".to_string()))
}

#[axum::debug_handler]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = IdentityService::new(&state);
    let session = service.signup(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account created successfully! Welcome to our veterinary platform.",
            "data": session
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): JsonBody<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = IdentityService::new(&state);
    let session = service.login(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "data": session
    })))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = IdentityService::new(&state);
    let profile = service.me(&user).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "user": profile }
    })))
}

/// Sessions are stateless; the client discards its token.
#[axum::debug_handler]
pub async fn logout(Extension(user): Extension<User>) -> Json<Value> {
    debug!("User {} logged out", user.id);

    Json(json!({
        "success": true,
        "message": "Logout successful"
    }))
}

pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    header: BearerHeader,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = bearer_token(header)?;

    match decode_token(&token, &state.config.jwt_secret) {
        Ok(user) => Ok(Json(TokenResponse {
            valid: true,
            user_id: user.id,
            email: user.email,
            role: user.role,
        })),
        Err(err) => Err(AppError::Auth(err)),
    }
}

pub async fn verify_token(
    State(state): State<Arc<AppState>>,
    header: BearerHeader,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = bearer_token(header)?;
    let valid = decode_token(&token, &state.config.jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}
