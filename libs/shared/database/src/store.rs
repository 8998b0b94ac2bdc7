use async_trait::async_trait;
use uuid::Uuid;

use shared_models::appointment::{Appointment, AppointmentFilter, AppointmentGuard, AppointmentPatch};
use shared_models::pagination::{Page, PageRequest};
use shared_models::prescription::{Prescription, PrescriptionChanges, PrescriptionFilter};
use shared_models::review::{Review, ReviewChanges, ReviewFilter};
use shared_models::user::{UserChanges, UserFilter, UserRecord};

use crate::error::StoreError;

/// Persistence for the clinic's four tables.
///
/// Every method is a single statement against the backing store. Methods
/// returning `Option` for a write report `None` when the row did not match
/// the id and ownership/guard predicate, so callers can tell "not applied"
/// from a transport failure.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    // Users

    /// Fails with [`StoreError::Conflict`] if the email is taken.
    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Ordered by name ascending.
    async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<UserRecord>, StoreError>;

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<UserRecord>, StoreError>;

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    // Appointments

    async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Ordered by scheduled date ascending.
    async fn list_appointments(&self, filter: &AppointmentFilter, page: PageRequest) -> Result<Page<Appointment>, StoreError>;

    async fn count_appointments(&self, filter: &AppointmentFilter) -> Result<u64, StoreError>;

    /// Appointments on which the user is either the patient or the doctor.
    async fn count_appointments_involving(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Compare-and-set claim: applies only where
    /// `id = X AND doctor_id IS NULL AND status = PENDING`, setting the
    /// doctor and moving the appointment to `CONFIRMED` in one write.
    async fn assign_doctor(&self, id: Uuid, doctor_id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Applies `patch` only while the row still matches `guard`.
    async fn update_appointment(
        &self,
        id: Uuid,
        guard: AppointmentGuard,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>, StoreError>;

    // Prescriptions

    /// Fails with [`StoreError::Conflict`] if the appointment already has one.
    async fn insert_prescription(&self, prescription: Prescription) -> Result<Prescription, StoreError>;

    async fn find_prescription(&self, id: Uuid) -> Result<Option<Prescription>, StoreError>;

    async fn find_prescription_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Prescription>, StoreError>;

    /// Ordered by creation time, newest first.
    async fn list_prescriptions(&self, filter: &PrescriptionFilter, page: PageRequest) -> Result<Page<Prescription>, StoreError>;

    /// Replaces diagnosis, medications and follow-up where `id = X AND doctor_id = D`.
    async fn replace_prescription(
        &self,
        id: Uuid,
        doctor_id: Uuid,
        changes: PrescriptionChanges,
    ) -> Result<Option<Prescription>, StoreError>;

    async fn delete_prescription(&self, id: Uuid, doctor_id: Uuid) -> Result<bool, StoreError>;

    // Reviews

    /// Fails with [`StoreError::Conflict`] if the appointment already has one.
    async fn insert_review(&self, review: Review) -> Result<Review, StoreError>;

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>, StoreError>;

    async fn find_review_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Review>, StoreError>;

    /// Ordered by creation time, newest first.
    async fn list_reviews(&self, filter: &ReviewFilter, page: PageRequest) -> Result<Page<Review>, StoreError>;

    async fn update_review(&self, id: Uuid, patient_id: Uuid, changes: ReviewChanges) -> Result<Option<Review>, StoreError>;

    async fn delete_review(&self, id: Uuid, patient_id: Uuid) -> Result<bool, StoreError>;

    /// Every rating left on appointments handled by the doctor.
    async fn ratings_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<u8>, StoreError>;
}
