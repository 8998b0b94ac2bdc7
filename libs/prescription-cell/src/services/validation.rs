use chrono::{DateTime, Utc};

use shared_models::error::AppError;
use shared_models::prescription::Medication;
use shared_utils::validation::{check_length, check_max_length};

use crate::models::PrescriptionBody;

fn validate_medication(medication: &Medication) -> Result<(), AppError> {
    check_length("Medication name", &medication.name, 1, 100)?;
    check_length("Dosage", &medication.dosage, 1, 50)?;
    check_length("Frequency", &medication.frequency, 1, 50)?;
    check_length("Duration", &medication.duration, 1, 50)?;
    if let Some(instructions) = &medication.instructions {
        check_max_length("Instructions", instructions, 200)?;
    }
    Ok(())
}

/// Same rules for create and update.
pub fn validate_body(body: &PrescriptionBody, now: DateTime<Utc>) -> Result<(), AppError> {
    check_length("Diagnosis", &body.diagnosis, 5, 1000)?;

    if body.medications.is_empty() {
        return Err(AppError::ValidationError(
            "At least one medication is required".to_string(),
        ));
    }
    for medication in &body.medications {
        validate_medication(medication)?;
    }

    check_length("Follow-up instructions", &body.follow_up_instructions, 10, 1000)?;

    if let Some(next) = body.next_appointment {
        if next <= now {
            return Err(AppError::ValidationError(
                "Next appointment must be in the future".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn medication() -> Medication {
        Medication {
            name: "Carprofen".to_string(),
            dosage: "25 mg".to_string(),
            frequency: "Once daily".to_string(),
            duration: "5 days".to_string(),
            instructions: Some("Give with food".to_string()),
        }
    }

    fn body() -> PrescriptionBody {
        PrescriptionBody {
            diagnosis: "Soft tissue sprain".to_string(),
            medications: vec![medication()],
            follow_up_instructions: "Restrict exercise for one week".to_string(),
            next_appointment: None,
        }
    }

    #[test]
    fn accepts_complete_body() {
        assert!(validate_body(&body(), Utc::now()).is_ok());
    }

    #[test]
    fn requires_a_medication() {
        let empty = PrescriptionBody { medications: vec![], ..body() };
        assert_eq!(
            validate_body(&empty, Utc::now()).unwrap_err().message(),
            "At least one medication is required"
        );
    }

    #[test]
    fn checks_each_medication() {
        let mut bad = medication();
        bad.dosage = String::new();
        let invalid = PrescriptionBody { medications: vec![medication(), bad], ..body() };
        assert_eq!(validate_body(&invalid, Utc::now()).unwrap_err().message(), "Dosage is required");
    }

    #[test]
    fn next_appointment_must_be_ahead() {
        let now = Utc::now();
        let past = PrescriptionBody { next_appointment: Some(now - Duration::days(1)), ..body() };
        assert!(validate_body(&past, now).is_err());

        let future = PrescriptionBody { next_appointment: Some(now + Duration::days(14)), ..body() };
        assert!(validate_body(&future, now).is_ok());
    }

    #[test]
    fn diagnosis_bounds() {
        let short = PrescriptionBody { diagnosis: "Itch".to_string(), ..body() };
        assert_eq!(
            validate_body(&short, Utc::now()).unwrap_err().message(),
            "Diagnosis must be at least 5 characters long"
        );
    }
}
