use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{AppState, ClinicStore};
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_models::user::{UserProfile, UserRecord};
use shared_utils::jwt::issue_token;
use shared_utils::password::{hash_password, verify_password};
use shared_utils::validation::{
    normalize_email, non_empty, validate_email, validate_name, validate_password, validate_phone,
    validate_specialty,
};

use crate::models::{AuthError, AuthSession, LoginRequest, SignupRequest};

/// Account registration and password login. Issues the session tokens the
/// auth middleware later validates.
pub struct IdentityService {
    store: Arc<dyn ClinicStore>,
    config: Arc<AppConfig>,
}

fn parse_role(raw: Option<&str>) -> Result<Role, AppError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(Role::Patient),
        Some(value) => value
            .parse::<Role>()
            .map_err(|_| AppError::ValidationError("Role must be either PATIENT or DOCTOR".to_string())),
    }
}

impl IdentityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: Arc::clone(&state.store),
            config: Arc::clone(&state.config),
        }
    }

    fn session_for(&self, record: &UserRecord) -> Result<AuthSession, AuthError> {
        let issued = issue_token(
            record.id,
            &record.email,
            record.role,
            &self.config.jwt_secret,
            self.config.jwt_ttl_hours,
        )
        .map_err(AuthError::Token)?;

        Ok(AuthSession {
            user: record.profile(),
            token: issued.token,
            expires_in: issued.expires_in_secs,
        })
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<AuthSession, AuthError> {
        validate_name(&request.name)?;
        validate_email(&request.email)?;
        validate_password(&request.password)?;
        let phone = non_empty(request.phone);
        if let Some(phone) = &phone {
            validate_phone(phone)?;
        }
        let role = parse_role(request.role.as_deref())?;
        let specialty = match role {
            Role::Doctor => non_empty(request.specialty),
            Role::Patient => None,
        };
        if let Some(specialty) = &specialty {
            validate_specialty(specialty)?;
        }

        let email = normalize_email(&request.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            warn!("Signup rejected, email already registered");
            return Err(AuthError::EmailExists);
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email,
            password_hash: hash_password(&request.password)?,
            phone,
            role,
            specialty,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_user(record).await?;
        info!("New user registered: {} ({})", created.id, created.role);

        self.session_for(&created)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::ValidationError("Email and password are required".to_string()).into());
        }

        let email = normalize_email(&request.email);
        let Some(record) = self.store.find_user_by_email(&email).await? else {
            debug!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&request.password, &record.password_hash)? {
            debug!("Login attempt with wrong password for {}", record.id);
            return Err(AuthError::InvalidCredentials);
        }

        info!("User {} logged in", record.id);
        self.session_for(&record)
    }

    pub async fn me(&self, actor: &User) -> Result<UserProfile, AuthError> {
        self.store
            .find_user(actor.id)
            .await?
            .map(|u| u.profile())
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_defaults_to_patient() {
        assert_eq!(parse_role(None).unwrap(), Role::Patient);
        assert_eq!(parse_role(Some("  ")).unwrap(), Role::Patient);
        assert_eq!(parse_role(Some("doctor")).unwrap(), Role::Doctor);
        assert!(parse_role(Some("admin")).is_err());
    }
}
