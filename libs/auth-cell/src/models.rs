use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::user::UserProfile;

pub const EMAIL_EXISTS: &str = "EMAIL_EXISTS";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
    /// `PATIENT` when omitted.
    pub role: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// What signup and login hand back to the client.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("An account with this email already exists. Please use a different email or try logging in.")]
    EmailExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Failed to issue session token: {0}")]
    Token(String),

    #[error(transparent)]
    Invalid(#[from] AppError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            // Two signups racing on the same address.
            StoreError::Conflict(_) => AuthError::EmailExists,
            other => AuthError::Store(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailExists => AppError::Conflict(err.to_string()).with_code(EMAIL_EXISTS),
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::Token(_) => AppError::Internal(err.to_string()),
            AuthError::Invalid(inner) => inner,
            AuthError::Store(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn duplicate_email_is_coded_conflict() {
        let app: AppError = AuthError::from(StoreError::Conflict("users_email_key".to_string())).into();
        assert_eq!(app.status_code(), StatusCode::CONFLICT);
        assert_eq!(app.code(), EMAIL_EXISTS);
    }

    #[test]
    fn bad_credentials_are_unauthorized() {
        let app: AppError = AuthError::InvalidCredentials.into();
        assert_eq!(app.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(app.message(), "Invalid email or password");
    }
}
