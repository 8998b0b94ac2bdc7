use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Role;

/// A row of the `users` table, including the password hash.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl UserRecord {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            phone: self.phone.clone(),
            specialty: self.specialty.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// What the API exposes about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
    /// Case-insensitive exact specialty.
    pub specialty: Option<String>,
}

impl UserFilter {
    pub fn matches(&self, user: &UserRecord) -> bool {
        let role_ok = self.role.map_or(true, |role| user.role == role);
        let search_ok = self.search.as_deref().map_or(true, |term| {
            let term = term.to_lowercase();
            user.name.to_lowercase().contains(&term) || user.email.to_lowercase().contains(&term)
        });
        let specialty_ok = self.specialty.as_deref().map_or(true, |wanted| {
            user.specialty
                .as_deref()
                .is_some_and(|s| s.trim().eq_ignore_ascii_case(wanted.trim()))
        });

        role_ok && search_ok && specialty_ok
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.specialty.is_none()
            && self.password_hash.is_none()
    }
}
