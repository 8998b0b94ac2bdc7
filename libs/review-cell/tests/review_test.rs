use assert_matches::assert_matches;
use uuid::Uuid;

use review_cell::models::{CreateReviewRequest, RatingCount, ReviewBody, ReviewError};
use review_cell::services::review::ReviewService;
use shared_database::{AppState, ClinicStore};
use shared_models::appointment::Appointment;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::pagination::PageRequest;
use shared_utils::test_utils::{appointment_record, completed_appointment, TestConfig, TestUser};

struct Visit {
    doctor: User,
    patient: User,
    appointment: Appointment,
}

async fn completed_visit(state: &AppState, doctor: &TestUser, patient: &TestUser) -> Visit {
    let appointment = state
        .store
        .insert_appointment(completed_appointment(patient.id, doctor.id))
        .await
        .unwrap();

    Visit {
        doctor: doctor.to_user(),
        patient: patient.to_user(),
        appointment,
    }
}

async fn clinic(state: &AppState) -> (TestUser, TestUser) {
    let doctor = TestUser::doctor("vet@example.com");
    let patient = TestUser::patient("owner@example.com");
    state.store.insert_user(doctor.to_record()).await.unwrap();
    state.store.insert_user(patient.to_record()).await.unwrap();
    (doctor, patient)
}

fn request(appointment_id: Uuid, rating: i64) -> CreateReviewRequest {
    CreateReviewRequest {
        appointment_id,
        body: ReviewBody {
            rating: Some(rating),
            comment: "Gentle with a very nervous cat".to_string(),
        },
    }
}

#[tokio::test]
async fn patient_reviews_completed_visit() {
    let state = TestConfig::default().to_state();
    let (doctor, patient) = clinic(&state).await;
    let visit = completed_visit(&state, &doctor, &patient).await;
    let service = ReviewService::new(&state);

    let review = service.create_review(&visit.patient, request(visit.appointment.id, 5)).await.unwrap();

    assert_eq!(review.rating, 5);
    assert_eq!(review.doctor_id, Some(visit.doctor.id));
    assert_eq!(service.get_review(&visit.doctor, review.id).await.unwrap(), review);
}

#[tokio::test]
async fn duplicate_review_is_a_conflict() {
    let state = TestConfig::default().to_state();
    let (doctor, patient) = clinic(&state).await;
    let visit = completed_visit(&state, &doctor, &patient).await;
    let service = ReviewService::new(&state);

    service.create_review(&visit.patient, request(visit.appointment.id, 4)).await.unwrap();
    let err = service
        .create_review(&visit.patient, request(visit.appointment.id, 2))
        .await
        .unwrap_err();

    assert_matches!(err, ReviewError::AlreadyExists);
}

#[tokio::test]
async fn only_completed_own_appointments_are_reviewable() {
    let state = TestConfig::default().to_state();
    let (doctor, patient) = clinic(&state).await;
    let visit = completed_visit(&state, &doctor, &patient).await;
    let service = ReviewService::new(&state);

    let pending = state
        .store
        .insert_appointment(appointment_record(patient.id))
        .await
        .unwrap();
    let err = service.create_review(&visit.patient, request(pending.id, 5)).await.unwrap_err();
    assert_matches!(err, ReviewError::AppointmentNotEligible);

    let stranger = TestUser::patient("neighbour@example.com").to_user();
    let err = service
        .create_review(&stranger, request(visit.appointment.id, 1))
        .await
        .unwrap_err();
    assert_matches!(AppError::from(err), AppError::NotFound(_));

    let err = service
        .create_review(&visit.doctor, request(visit.appointment.id, 5))
        .await
        .unwrap_err();
    assert_matches!(AppError::from(err), AppError::Forbidden(_));
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let state = TestConfig::default().to_state();
    let (doctor, patient) = clinic(&state).await;
    let visit = completed_visit(&state, &doctor, &patient).await;
    let service = ReviewService::new(&state);

    let err = service
        .create_review(&visit.patient, request(visit.appointment.id, 9))
        .await
        .unwrap_err();

    assert_matches!(err, ReviewError::Invalid(AppError::ValidationError(ref msg)) if msg == "Rating cannot exceed 5");
}

#[tokio::test]
async fn owner_updates_and_deletes() {
    let state = TestConfig::default().to_state();
    let (doctor, patient) = clinic(&state).await;
    let visit = completed_visit(&state, &doctor, &patient).await;
    let service = ReviewService::new(&state);
    let review = service.create_review(&visit.patient, request(visit.appointment.id, 3)).await.unwrap();

    let revised = ReviewBody {
        rating: Some(4),
        comment: "Follow-up call was really helpful".to_string(),
    };
    let updated = service.update_review(&visit.patient, review.id, revised.clone()).await.unwrap();
    assert_eq!(updated.rating, 4);

    let stranger = TestUser::patient("neighbour@example.com").to_user();
    let err = service.update_review(&stranger, review.id, revised).await.unwrap_err();
    assert_matches!(err, ReviewError::NotOwned("update"));

    let err = service.delete_review(&stranger, review.id).await.unwrap_err();
    assert_matches!(err, ReviewError::NotOwned("delete"));

    service.delete_review(&visit.patient, review.id).await.unwrap();
    assert!(state.store.find_review(review.id).await.unwrap().is_none());
}

#[tokio::test]
async fn doctor_filter_narrows_listing() {
    let state = TestConfig::default().to_state();
    let (doctor, patient) = clinic(&state).await;
    let visit = completed_visit(&state, &doctor, &patient).await;
    let service = ReviewService::new(&state);
    service.create_review(&visit.patient, request(visit.appointment.id, 5)).await.unwrap();

    let page = PageRequest::default();
    let (own, pagination) = service.list_reviews(&visit.doctor, None, page).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(pagination.total, 1);

    let (mismatched, pagination) = service
        .list_reviews(&visit.doctor, Some(Uuid::new_v4()), page)
        .await
        .unwrap();
    assert!(mismatched.is_empty());
    assert_eq!(pagination.total, 0);

    let (by_patient, _) = service
        .list_reviews(&visit.patient, Some(visit.doctor.id), page)
        .await
        .unwrap();
    assert_eq!(by_patient.len(), 1);
}

#[tokio::test]
async fn stats_cover_every_rating() {
    let state = TestConfig::default().to_state();
    let (doctor, patient) = clinic(&state).await;
    let service = ReviewService::new(&state);

    for rating in [5, 4, 4] {
        let visit = completed_visit(&state, &doctor, &patient).await;
        service
            .create_review(&visit.patient, request(visit.appointment.id, rating))
            .await
            .unwrap();
    }

    let stats = service.doctor_stats(doctor.id).await.unwrap();
    assert_eq!(stats.total_reviews, 3);
    assert_eq!(stats.average_rating, 4.33);
    assert_eq!(stats.rating_distribution.len(), 5);
    assert_eq!(stats.rating_distribution[3], RatingCount { rating: 4, count: 2 });

    let empty = service.doctor_stats(Uuid::new_v4()).await.unwrap();
    assert_eq!(empty.total_reviews, 0);
    assert_eq!(empty.average_rating, 0.0);
}
