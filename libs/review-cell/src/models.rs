use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub appointment_id: Uuid,
    #[serde(flatten)]
    pub body: ReviewBody,
}

/// Rating is read wide so out-of-range values reach validation instead of
/// failing JSON extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewBody {
    pub rating: Option<i64>,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewListQuery {
    pub doctor_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingCount {
    pub rating: u8,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorReviewStats {
    pub total_reviews: u64,
    pub average_rating: f64,
    pub rating_distribution: Vec<RatingCount>,
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Review not found")]
    NotFound,

    #[error("Appointment not found, not completed, or you do not have permission to review it")]
    AppointmentNotEligible,

    #[error("Review already exists for this appointment")]
    AlreadyExists,

    #[error("Review not found or you do not have permission to {0} it")]
    NotOwned(&'static str),

    #[error("Only patients can {0}")]
    PatientOnly(&'static str),

    #[error(transparent)]
    Invalid(#[from] AppError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ReviewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => ReviewError::AlreadyExists,
            other => ReviewError::Store(other),
        }
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::NotFound | ReviewError::AppointmentNotEligible | ReviewError::NotOwned(_) => {
                AppError::NotFound(err.to_string())
            }
            ReviewError::AlreadyExists => AppError::Conflict(err.to_string()),
            ReviewError::PatientOnly(_) => AppError::Forbidden(err.to_string()),
            ReviewError::Invalid(inner) => inner,
            ReviewError::Store(inner) => inner.into(),
        }
    }
}
