use chrono::{DateTime, Utc};

use shared_models::error::AppError;
use shared_utils::validation::{check_length, check_max_length, check_required, validate_phone};

use crate::models::{CreateAppointmentRequest, UpdateAppointmentRequest};

pub const MAX_ADDITIONAL_NOTES: usize = 500;
pub const MAX_DOCTOR_NOTES: usize = 1000;

/// Field checks for a booking, in form order; the first failure wins.
pub fn validate_create(request: &CreateAppointmentRequest, now: DateTime<Utc>) -> Result<(), AppError> {
    validate_phone(&request.phone)?;
    check_length("Pet name", &request.pet_name, 1, 50)?;
    check_required("Animal type", &request.animal_type)?;
    check_length("Breed", &request.breed, 1, 50)?;
    check_length("Pet age", &request.pet_age, 1, 20)?;
    check_required("Reason for appointment", &request.reason)?;
    check_length("Reason", &request.reason, 10, 500)?;
    check_required("Doctor specialty", &request.doctor_specialty)?;

    match request.date {
        None => return Err(AppError::ValidationError("Appointment date is required".to_string())),
        Some(date) if date <= now => {
            return Err(AppError::ValidationError(
                "Appointment date must be in the future".to_string(),
            ))
        }
        Some(_) => {}
    }

    check_required("Appointment time", &request.time)?;

    if let Some(notes) = &request.additional_notes {
        check_max_length("Additional notes", notes, MAX_ADDITIONAL_NOTES)?;
    }

    Ok(())
}

pub fn validate_update(request: &UpdateAppointmentRequest) -> Result<(), AppError> {
    if let Some(notes) = &request.doctor_notes {
        check_max_length("Doctor notes", notes, MAX_DOCTOR_NOTES)?;
    }
    Ok(())
}
