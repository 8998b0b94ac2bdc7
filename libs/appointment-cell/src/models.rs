use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::appointment::{Appointment, AppointmentStatus, Priority};
use shared_models::error::AppError;
use shared_models::prescription::Prescription;
use shared_models::review::Review;

pub const INVALID_STATUS_TRANSITION: &str = "INVALID_STATUS_TRANSITION";

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking form. Text fields default to empty so that a missing field is
/// reported as "... is required" rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAppointmentRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub pet_name: String,
    #[serde(default)]
    pub animal_type: String,
    #[serde(default)]
    pub breed: String,
    #[serde(default)]
    pub pet_age: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub doctor_specialty: String,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time: String,
    pub additional_notes: Option<String>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub doctor_notes: Option<String>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    /// One of the four statuses, or `all`.
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// An appointment with whatever was attached to it after completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub prescription: Option<Prescription>,
    pub review: Option<Review>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: u64,
    pub pending: u64,
    pub confirmed: u64,
    pub completed: u64,
    pub cancelled: u64,
    /// Appointments scheduled for the current local calendar day.
    pub today: u64,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment not found or you do not have permission to cancel it")]
    CancelNotPermitted,

    #[error("Appointment is already assigned to a doctor")]
    AlreadyAssigned,

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment is {0} and can no longer be modified")]
    Terminal(AppointmentStatus),

    #[error("Appointment was modified by another request, please reload and try again")]
    ConcurrentModification,

    #[error("Only patients can book appointments")]
    PatientOnly,

    #[error("Only doctors can {0}")]
    DoctorOnly(&'static str),

    #[error("Patient not found")]
    PatientNotFound,

    #[error(transparent)]
    Invalid(#[from] AppError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::CancelNotPermitted
            | AppointmentError::PatientNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::AlreadyAssigned | AppointmentError::ConcurrentModification => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::InvalidStatusTransition { .. } | AppointmentError::Terminal(_) => {
                AppError::BadRequest(err.to_string()).with_code(INVALID_STATUS_TRANSITION)
            }
            AppointmentError::PatientOnly | AppointmentError::DoctorOnly(_) => {
                AppError::Forbidden(err.to_string())
            }
            AppointmentError::Invalid(inner) => inner,
            AppointmentError::Store(inner) => inner.into(),
        }
    }
}
