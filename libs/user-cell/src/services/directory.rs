use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_database::{AppState, ClinicStore};
use shared_models::auth::{Role, User};
use shared_models::pagination::{PageRequest, Pagination};
use shared_models::user::{UserFilter, UserProfile};
use shared_utils::extractor::require_role;
use shared_utils::validation::non_empty;

use crate::models::UserError;

/// Read side of the user table: doctor and patient directories and
/// single-profile lookups.
pub struct DirectoryService {
    store: Arc<dyn ClinicStore>,
}

impl DirectoryService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: Arc::clone(&state.store),
        }
    }

    pub async fn list_doctors(
        &self,
        specialty: Option<String>,
        page: PageRequest,
    ) -> Result<(Vec<UserProfile>, Pagination), UserError> {
        let filter = UserFilter {
            role: Some(Role::Doctor),
            specialty: non_empty(specialty),
            ..Default::default()
        };
        let result = self.store.list_users(&filter, page).await?;
        debug!("Doctor directory page {} holds {} of {}", page.page, result.items.len(), result.total);

        let pagination = Pagination::new(page, result.total);
        Ok((result.items.iter().map(|u| u.profile()).collect(), pagination))
    }

    pub async fn list_patients(
        &self,
        actor: &User,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<(Vec<UserProfile>, Pagination), UserError> {
        require_role(actor, Role::Doctor)?;

        let filter = UserFilter {
            role: Some(Role::Patient),
            search: non_empty(search),
            ..Default::default()
        };
        let result = self.store.list_users(&filter, page).await?;

        let pagination = Pagination::new(page, result.total);
        Ok((result.items.iter().map(|u| u.profile()).collect(), pagination))
    }

    /// Self, or any doctor. Everyone else is refused before the lookup.
    pub async fn get_user(&self, actor: &User, id: Uuid) -> Result<UserProfile, UserError> {
        if actor.id != id && !actor.is_doctor() {
            return Err(UserError::NotSelf("view your own profile"));
        }

        self.store
            .find_user(id)
            .await?
            .map(|u| u.profile())
            .ok_or(UserError::NotFound)
    }
}
