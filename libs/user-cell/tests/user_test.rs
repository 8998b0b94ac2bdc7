use assert_matches::assert_matches;

use shared_database::{AppState, ClinicStore};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::pagination::PageRequest;
use shared_utils::password::{hash_password, verify_password};
use shared_utils::test_utils::{appointment_record, TestConfig, TestUser};
use user_cell::models::{UpdatePasswordRequest, UpdateProfileRequest, UserError, ACCOUNT_HAS_APPOINTMENTS};
use user_cell::services::directory::DirectoryService;
use user_cell::services::profile::ProfileService;

async fn seed(state: &AppState, user: &TestUser) -> User {
    state.store.insert_user(user.to_record()).await.unwrap();
    user.to_user()
}

async fn seed_doctor(state: &AppState, email: &str, specialty: &str) -> User {
    let user = TestUser::doctor(email);
    let mut record = user.to_record();
    record.specialty = Some(specialty.to_string());
    state.store.insert_user(record).await.unwrap();
    user.to_user()
}

#[tokio::test]
async fn doctor_directory_filters_by_specialty() {
    let state = TestConfig::default().to_state();
    seed_doctor(&state, "ortho@example.com", "Orthopedics").await;
    seed_doctor(&state, "derm@example.com", "Dermatology").await;
    seed(&state, &TestUser::patient("owner@example.com")).await;
    let service = DirectoryService::new(&state);

    let (all, pagination) = service.list_doctors(None, PageRequest::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(pagination.total, 2);

    let (ortho, _) = service
        .list_doctors(Some("orthopedics".to_string()), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(ortho.len(), 1);
    assert_eq!(ortho[0].email, "ortho@example.com");
}

#[tokio::test]
async fn patient_directory_is_for_doctors() {
    let state = TestConfig::default().to_state();
    let doctor = seed(&state, &TestUser::doctor("vet@example.com")).await;
    let patient = seed(&state, &TestUser::patient("alice@example.com")).await;
    seed(&state, &TestUser::patient("bob@example.com")).await;
    let service = DirectoryService::new(&state);

    let err = service
        .list_patients(&patient, None, PageRequest::default())
        .await
        .unwrap_err();
    assert_matches!(AppError::from(err), AppError::Forbidden(_));

    let (found, pagination) = service
        .list_patients(&doctor, Some("ALICE".to_string()), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(pagination.total, 1);
    assert_eq!(found[0].id, patient.id);
}

#[tokio::test]
async fn profiles_are_visible_to_self_and_doctors() {
    let state = TestConfig::default().to_state();
    let doctor = seed(&state, &TestUser::doctor("vet@example.com")).await;
    let alice = seed(&state, &TestUser::patient("alice@example.com")).await;
    let bob = seed(&state, &TestUser::patient("bob@example.com")).await;
    let service = DirectoryService::new(&state);

    assert_eq!(service.get_user(&alice, alice.id).await.unwrap().id, alice.id);
    assert_eq!(service.get_user(&doctor, alice.id).await.unwrap().id, alice.id);

    let err = service.get_user(&bob, alice.id).await.unwrap_err();
    assert_matches!(err, UserError::NotSelf(_));

    let err = service.get_user(&doctor, uuid::Uuid::new_v4()).await.unwrap_err();
    assert_matches!(err, UserError::NotFound);
}

#[tokio::test]
async fn profile_update_validates_and_applies() {
    let state = TestConfig::default().to_state();
    let alice = seed(&state, &TestUser::patient("alice@example.com")).await;
    let service = ProfileService::new(&state);

    let err = service
        .update_profile(
            &alice,
            alice.id,
            UpdateProfileRequest { phone: Some("123".to_string()), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert_matches!(err, UserError::Invalid(AppError::ValidationError(_)));

    let updated = service
        .update_profile(
            &alice,
            alice.id,
            UpdateProfileRequest {
                name: Some("Alice Moreau".to_string()),
                phone: Some("5550001111".to_string()),
                specialty: Some("Cardiology".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Alice Moreau");
    assert_eq!(updated.phone.as_deref(), Some("5550001111"));
    assert!(updated.specialty.is_none());

    let bob = seed(&state, &TestUser::patient("bob@example.com")).await;
    let err = service
        .update_profile(&bob, alice.id, UpdateProfileRequest::default())
        .await
        .unwrap_err();
    assert_matches!(AppError::from(err), AppError::Forbidden(_));
}

#[tokio::test]
async fn password_change_requires_current_password() {
    let state = TestConfig::default().to_state();
    let user = TestUser::patient("alice@example.com");
    let mut record = user.to_record();
    record.password_hash = hash_password("old-secret").unwrap();
    state.store.insert_user(record).await.unwrap();
    let alice = user.to_user();
    let service = ProfileService::new(&state);

    let wrong = UpdatePasswordRequest {
        current_password: "not-it".to_string(),
        new_password: "new-secret".to_string(),
    };
    let err = service.update_password(&alice, alice.id, wrong).await.unwrap_err();
    assert_matches!(AppError::from(err), AppError::BadRequest(_));

    let weak = UpdatePasswordRequest {
        current_password: "old-secret".to_string(),
        new_password: "abc".to_string(),
    };
    assert!(service.update_password(&alice, alice.id, weak).await.is_err());

    let good = UpdatePasswordRequest {
        current_password: "old-secret".to_string(),
        new_password: "new-secret".to_string(),
    };
    service.update_password(&alice, alice.id, good).await.unwrap();

    let stored = state.store.find_user(alice.id).await.unwrap().unwrap();
    assert!(verify_password("new-secret", &stored.password_hash).unwrap());
}

#[tokio::test]
async fn accounts_with_appointments_cannot_be_deleted() {
    let state = TestConfig::default().to_state();
    let alice = seed(&state, &TestUser::patient("alice@example.com")).await;
    let bob = seed(&state, &TestUser::patient("bob@example.com")).await;
    state.store.insert_appointment(appointment_record(alice.id)).await.unwrap();
    let service = ProfileService::new(&state);

    let err = service.delete_account(&alice, alice.id).await.unwrap_err();
    let app = AppError::from(err);
    assert_eq!(app.code(), ACCOUNT_HAS_APPOINTMENTS);
    assert_matches!(app.kind(), AppError::Conflict(_));

    let err = service.delete_account(&alice, bob.id).await.unwrap_err();
    assert_matches!(err, UserError::NotSelf(_));

    service.delete_account(&bob, bob.id).await.unwrap();
    assert!(state.store.find_user(bob.id).await.unwrap().is_none());
}
