use assert_matches::assert_matches;
use uuid::Uuid;

use prescription_cell::models::{CreatePrescriptionRequest, PrescriptionBody, PrescriptionError};
use prescription_cell::services::prescription::PrescriptionService;
use shared_database::{AppState, ClinicStore};
use shared_models::appointment::Appointment;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::pagination::PageRequest;
use shared_models::prescription::Medication;
use shared_utils::test_utils::{appointment_record, completed_appointment, TestConfig, TestUser};

struct Clinic {
    doctor: User,
    patient: User,
    appointment: Appointment,
}

async fn completed_visit(state: &AppState) -> Clinic {
    let doctor = TestUser::doctor("vet@example.com");
    let patient = TestUser::patient("owner@example.com");
    state.store.insert_user(doctor.to_record()).await.unwrap();
    state.store.insert_user(patient.to_record()).await.unwrap();

    let appointment = state
        .store
        .insert_appointment(completed_appointment(patient.id, doctor.id))
        .await
        .unwrap();

    Clinic {
        doctor: doctor.to_user(),
        patient: patient.to_user(),
        appointment,
    }
}

fn body() -> PrescriptionBody {
    PrescriptionBody {
        diagnosis: "Mild hip dysplasia".to_string(),
        medications: vec![Medication {
            name: "Meloxicam".to_string(),
            dosage: "0.1 mg/kg".to_string(),
            frequency: "Once daily".to_string(),
            duration: "14 days".to_string(),
            instructions: None,
        }],
        follow_up_instructions: "Short leash walks only until the recheck".to_string(),
        next_appointment: None,
    }
}

fn request(appointment_id: Uuid) -> CreatePrescriptionRequest {
    CreatePrescriptionRequest { appointment_id, body: body() }
}

#[tokio::test]
async fn doctor_prescribes_for_completed_visit() {
    let state = TestConfig::default().to_state();
    let clinic = completed_visit(&state).await;
    let service = PrescriptionService::new(&state);

    let prescription = service
        .create_prescription(&clinic.doctor, request(clinic.appointment.id))
        .await
        .unwrap();

    assert_eq!(prescription.patient_id, clinic.patient.id);
    assert_eq!(prescription.doctor_id, clinic.doctor.id);
    assert_eq!(prescription.medications.len(), 1);

    let seen_by_patient = service.get_prescription(&clinic.patient, prescription.id).await.unwrap();
    assert_eq!(seen_by_patient, prescription);
}

#[tokio::test]
async fn second_prescription_is_a_conflict() {
    let state = TestConfig::default().to_state();
    let clinic = completed_visit(&state).await;
    let service = PrescriptionService::new(&state);

    service
        .create_prescription(&clinic.doctor, request(clinic.appointment.id))
        .await
        .unwrap();
    let err = service
        .create_prescription(&clinic.doctor, request(clinic.appointment.id))
        .await
        .unwrap_err();

    assert_matches!(err, PrescriptionError::AlreadyExists);
    assert_matches!(AppError::from(err), AppError::Conflict(_));
}

#[tokio::test]
async fn open_or_foreign_appointments_are_not_eligible() {
    let state = TestConfig::default().to_state();
    let clinic = completed_visit(&state).await;
    let service = PrescriptionService::new(&state);

    let pending = state
        .store
        .insert_appointment(appointment_record(clinic.patient.id))
        .await
        .unwrap();
    let err = service
        .create_prescription(&clinic.doctor, request(pending.id))
        .await
        .unwrap_err();
    assert_matches!(err, PrescriptionError::AppointmentNotEligible);

    let other_doctor = TestUser::doctor("locum@example.com").to_user();
    let err = service
        .create_prescription(&other_doctor, request(clinic.appointment.id))
        .await
        .unwrap_err();
    assert_matches!(AppError::from(err), AppError::NotFound(_));

    let err = service
        .create_prescription(&clinic.patient, request(clinic.appointment.id))
        .await
        .unwrap_err();
    assert_matches!(AppError::from(err), AppError::Forbidden(_));
}

#[tokio::test]
async fn invalid_body_is_rejected_before_lookup() {
    let state = TestConfig::default().to_state();
    let clinic = completed_visit(&state).await;
    let service = PrescriptionService::new(&state);

    let empty = CreatePrescriptionRequest {
        appointment_id: clinic.appointment.id,
        body: PrescriptionBody { medications: vec![], ..body() },
    };
    let err = service.create_prescription(&clinic.doctor, empty).await.unwrap_err();

    assert_matches!(err, PrescriptionError::Invalid(AppError::ValidationError(_)));
    assert!(state
        .store
        .find_prescription_for_appointment(clinic.appointment.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn only_the_author_can_update_or_delete() {
    let state = TestConfig::default().to_state();
    let clinic = completed_visit(&state).await;
    let service = PrescriptionService::new(&state);
    let created = service
        .create_prescription(&clinic.doctor, request(clinic.appointment.id))
        .await
        .unwrap();

    let other_doctor = TestUser::doctor("locum@example.com").to_user();
    let err = service
        .update_prescription(&other_doctor, created.id, body())
        .await
        .unwrap_err();
    assert_matches!(err, PrescriptionError::NotOwned("update"));

    let revised = PrescriptionBody {
        diagnosis: "Moderate hip dysplasia".to_string(),
        ..body()
    };
    let updated = service
        .update_prescription(&clinic.doctor, created.id, revised)
        .await
        .unwrap();
    assert_eq!(updated.diagnosis, "Moderate hip dysplasia");
    assert_eq!(updated.appointment_id, created.appointment_id);

    let err = service.delete_prescription(&other_doctor, created.id).await.unwrap_err();
    assert_matches!(err, PrescriptionError::NotOwned("delete"));

    service.delete_prescription(&clinic.doctor, created.id).await.unwrap();
    let err = service.get_prescription(&clinic.doctor, created.id).await.unwrap_err();
    assert_matches!(err, PrescriptionError::NotFound);
}

#[tokio::test]
async fn listing_is_scoped_to_the_actor() {
    let state = TestConfig::default().to_state();
    let clinic = completed_visit(&state).await;
    let service = PrescriptionService::new(&state);
    service
        .create_prescription(&clinic.doctor, request(clinic.appointment.id))
        .await
        .unwrap();

    let page = PageRequest::default();
    let (mine, pagination) = service.list_prescriptions(&clinic.patient, page).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(pagination.total, 1);
    assert_eq!(pagination.pages, 1);

    let stranger = TestUser::patient("neighbour@example.com").to_user();
    let (theirs, pagination) = service.list_prescriptions(&stranger, page).await.unwrap();
    assert!(theirs.is_empty());
    assert_eq!(pagination.total, 0);

    let err = service.get_prescription(&stranger, mine[0].id).await.unwrap_err();
    assert_matches!(err, PrescriptionError::NotFound);
}
