use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::prescription::Medication;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrescriptionRequest {
    pub appointment_id: Uuid,
    #[serde(flatten)]
    pub body: PrescriptionBody,
}

/// The doctor-editable part of a prescription. Updates send the whole body
/// and the medication list is replaced, never merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrescriptionBody {
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub follow_up_instructions: String,
    pub next_appointment: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrescriptionListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Error, Debug)]
pub enum PrescriptionError {
    #[error("Prescription not found")]
    NotFound,

    #[error("Appointment not found, not completed, or you do not have permission to create prescription for it")]
    AppointmentNotEligible,

    #[error("Prescription already exists for this appointment")]
    AlreadyExists,

    #[error("Prescription not found or you do not have permission to {0} it")]
    NotOwned(&'static str),

    #[error("Only doctors can {0}")]
    DoctorOnly(&'static str),

    #[error(transparent)]
    Invalid(#[from] AppError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for PrescriptionError {
    fn from(err: StoreError) -> Self {
        match err {
            // Unique appointment key lost a race with another insert.
            StoreError::Conflict(_) => PrescriptionError::AlreadyExists,
            other => PrescriptionError::Store(other),
        }
    }
}

impl From<PrescriptionError> for AppError {
    fn from(err: PrescriptionError) -> Self {
        match err {
            PrescriptionError::NotFound
            | PrescriptionError::AppointmentNotEligible
            | PrescriptionError::NotOwned(_) => AppError::NotFound(err.to_string()),
            PrescriptionError::AlreadyExists => AppError::Conflict(err.to_string()),
            PrescriptionError::DoctorOnly(_) => AppError::Forbidden(err.to_string()),
            PrescriptionError::Invalid(inner) => inner,
            PrescriptionError::Store(inner) => inner.into(),
        }
    }
}
