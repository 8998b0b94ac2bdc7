use serde::Deserialize;
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;

pub const ACCOUNT_HAS_APPOINTMENTS: &str = "ACCOUNT_HAS_APPOINTMENTS";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorListQuery {
    pub specialty: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Access denied. You can only {0}.")]
    NotSelf(&'static str),

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("Cannot delete account. You have existing appointments. Please contact support.")]
    HasAppointments,

    #[error(transparent)]
    Invalid(#[from] AppError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => AppError::NotFound(err.to_string()),
            UserError::NotSelf(_) => AppError::Forbidden(err.to_string()),
            UserError::WrongPassword => AppError::BadRequest(err.to_string()),
            UserError::HasAppointments => {
                AppError::Conflict(err.to_string()).with_code(ACCOUNT_HAS_APPOINTMENTS)
            }
            UserError::Invalid(inner) => inner,
            UserError::Store(inner) => inner.into(),
        }
    }
}
