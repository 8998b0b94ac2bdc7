use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use shared_database::{AppState, ClinicStore};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::user::{UserChanges, UserProfile};
use shared_utils::password::{hash_password, verify_password};
use shared_utils::validation::{validate_name, validate_password, validate_phone, validate_specialty};

use crate::models::{UpdatePasswordRequest, UpdateProfileRequest, UserError};

/// Self-service account changes. Every operation is limited to the
/// caller's own account.
pub struct ProfileService {
    store: Arc<dyn ClinicStore>,
}

impl ProfileService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: Arc::clone(&state.store),
        }
    }

    pub async fn update_profile(
        &self,
        actor: &User,
        id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, UserError> {
        if actor.id != id {
            return Err(UserError::NotSelf("update your own profile"));
        }

        if let Some(name) = &request.name {
            validate_name(name)?;
        }
        if let Some(phone) = &request.phone {
            validate_phone(phone)?;
        }
        if let Some(specialty) = &request.specialty {
            validate_specialty(specialty)?;
        }

        let changes = UserChanges {
            name: request.name.map(|n| n.trim().to_string()),
            phone: request.phone.map(|p| p.trim().to_string()),
            // Only doctors carry a specialty.
            specialty: request
                .specialty
                .filter(|_| actor.is_doctor())
                .map(|s| s.trim().to_string()),
            ..Default::default()
        };

        let updated = if changes.is_empty() {
            self.store.find_user(id).await?
        } else {
            self.store.update_user(id, changes).await?
        };

        let record = updated.ok_or(UserError::NotFound)?;
        info!("Profile {} updated", id);
        Ok(record.profile())
    }

    pub async fn update_password(
        &self,
        actor: &User,
        id: Uuid,
        request: UpdatePasswordRequest,
    ) -> Result<(), UserError> {
        if actor.id != id {
            return Err(UserError::NotSelf("update your own password"));
        }

        if request.current_password.is_empty() || request.new_password.is_empty() {
            return Err(AppError::ValidationError(
                "Current password and new password are required".to_string(),
            )
            .into());
        }
        validate_password(&request.new_password)?;

        let record = self.store.find_user(id).await?.ok_or(UserError::NotFound)?;
        if !verify_password(&request.current_password, &record.password_hash)? {
            warn!("Rejected password change for {}: current password mismatch", id);
            return Err(UserError::WrongPassword);
        }

        let changes = UserChanges {
            password_hash: Some(hash_password(&request.new_password)?),
            ..Default::default()
        };
        self.store.update_user(id, changes).await?.ok_or(UserError::NotFound)?;

        info!("Password updated for {}", id);
        Ok(())
    }

    /// Refused while the account is patient or doctor on any appointment.
    pub async fn delete_account(&self, actor: &User, id: Uuid) -> Result<(), UserError> {
        if actor.id != id {
            return Err(UserError::NotSelf("delete your own account"));
        }

        if self.store.count_appointments_involving(id).await? > 0 {
            warn!("Refused to delete account {} with appointments on record", id);
            return Err(UserError::HasAppointments);
        }

        if !self.store.delete_user(id).await? {
            return Err(UserError::NotFound);
        }

        info!("Account {} deleted", id);
        Ok(())
    }
}
