use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::appointment::{
    Appointment, AppointmentFilter, AppointmentGuard, AppointmentPatch, AppointmentStatus,
};
use shared_models::pagination::{Page, PageRequest};
use shared_models::prescription::{Prescription, PrescriptionChanges, PrescriptionFilter};
use shared_models::review::{Review, ReviewChanges, ReviewFilter};
use shared_models::user::{UserChanges, UserFilter, UserRecord};

use crate::error::StoreError;
use crate::store::ClinicStore;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    appointments: HashMap<Uuid, Appointment>,
    prescriptions: HashMap<Uuid, Prescription>,
    reviews: HashMap<Uuid, Review>,
}

/// Process-local store. Each trait method holds the table lock for its
/// whole check-and-write, which gives the same single-statement atomicity
/// the relational backend provides.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(mut rows: Vec<T>, page: PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let items = rows
        .drain(..)
        .skip(page.offset())
        .take(page.limit as usize)
        .collect();
    Page { items, total }
}

#[async_trait]
impl ClinicStore for MemoryStore {
    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<UserRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<UserRecord> = tables
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(paginate(rows, page))
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<UserRecord>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        if let Some(specialty) = changes.specialty {
            user.specialty = Some(specialty);
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.users.remove(&id).is_some())
    }

    async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.write().await;
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.tables.read().await.appointments.get(&id).cloned())
    }

    async fn list_appointments(&self, filter: &AppointmentFilter, page: PageRequest) -> Result<Page<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(paginate(rows, page))
    }

    async fn count_appointments(&self, filter: &AppointmentFilter) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.appointments.values().filter(|a| filter.matches(a)).count() as u64)
    }

    async fn count_appointments_involving(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .appointments
            .values()
            .filter(|a| a.patient_id == user_id || a.doctor_id == Some(user_id))
            .count() as u64)
    }

    async fn assign_doctor(&self, id: Uuid, doctor_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.appointments.get_mut(&id) {
            Some(appointment)
                if appointment.doctor_id.is_none()
                    && appointment.status == AppointmentStatus::Pending =>
            {
                appointment.doctor_id = Some(doctor_id);
                appointment.status = AppointmentStatus::Confirmed;
                appointment.updated_at = Utc::now();
                Ok(Some(appointment.clone()))
            }
            _ => {
                debug!("Assignment of {} to doctor {} did not match any row", id, doctor_id);
                Ok(None)
            }
        }
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        guard: AppointmentGuard,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(appointment) = tables.appointments.get_mut(&id) else {
            return Ok(None);
        };

        if AppointmentGuard::from(&*appointment) != guard {
            debug!("Guard mismatch updating appointment {}", id);
            return Ok(None);
        }

        if let Some(status) = patch.status {
            appointment.status = status;
        }
        if let Some(notes) = patch.doctor_notes {
            appointment.doctor_notes = Some(notes);
        }
        if let Some(priority) = patch.priority {
            appointment.priority = priority;
        }
        if let Some(doctor_id) = patch.doctor_id {
            appointment.doctor_id = Some(doctor_id);
        }
        appointment.updated_at = Utc::now();

        Ok(Some(appointment.clone()))
    }

    async fn insert_prescription(&self, prescription: Prescription) -> Result<Prescription, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .prescriptions
            .values()
            .any(|p| p.appointment_id == prescription.appointment_id)
        {
            return Err(StoreError::Conflict(format!(
                "appointment {} already has a prescription",
                prescription.appointment_id
            )));
        }
        tables.prescriptions.insert(prescription.id, prescription.clone());
        Ok(prescription)
    }

    async fn find_prescription(&self, id: Uuid) -> Result<Option<Prescription>, StoreError> {
        Ok(self.tables.read().await.prescriptions.get(&id).cloned())
    }

    async fn find_prescription_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Prescription>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .prescriptions
            .values()
            .find(|p| p.appointment_id == appointment_id)
            .cloned())
    }

    async fn list_prescriptions(&self, filter: &PrescriptionFilter, page: PageRequest) -> Result<Page<Prescription>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Prescription> = tables
            .prescriptions
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(rows, page))
    }

    async fn replace_prescription(
        &self,
        id: Uuid,
        doctor_id: Uuid,
        changes: PrescriptionChanges,
    ) -> Result<Option<Prescription>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.prescriptions.get_mut(&id) {
            Some(prescription) if prescription.doctor_id == doctor_id => {
                prescription.diagnosis = changes.diagnosis;
                prescription.medications = changes.medications;
                prescription.follow_up_instructions = changes.follow_up_instructions;
                prescription.next_appointment = changes.next_appointment;
                prescription.updated_at = Utc::now();
                Ok(Some(prescription.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_prescription(&self, id: Uuid, doctor_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .prescriptions
            .get(&id)
            .is_some_and(|p| p.doctor_id == doctor_id);
        if owned {
            tables.prescriptions.remove(&id);
        }
        Ok(owned)
    }

    async fn insert_review(&self, review: Review) -> Result<Review, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.reviews.values().any(|r| r.appointment_id == review.appointment_id) {
            return Err(StoreError::Conflict(format!(
                "appointment {} already has a review",
                review.appointment_id
            )));
        }
        tables.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        Ok(self.tables.read().await.reviews.get(&id).cloned())
    }

    async fn find_review_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Review>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .find(|r| r.appointment_id == appointment_id)
            .cloned())
    }

    async fn list_reviews(&self, filter: &ReviewFilter, page: PageRequest) -> Result<Page<Review>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(rows, page))
    }

    async fn update_review(&self, id: Uuid, patient_id: Uuid, changes: ReviewChanges) -> Result<Option<Review>, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.reviews.get_mut(&id) {
            Some(review) if review.patient_id == patient_id => {
                review.rating = changes.rating;
                review.comment = changes.comment;
                review.updated_at = Utc::now();
                Ok(Some(review.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_review(&self, id: Uuid, patient_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let owned = tables.reviews.get(&id).is_some_and(|r| r.patient_id == patient_id);
        if owned {
            tables.reviews.remove(&id);
        }
        Ok(owned)
    }

    async fn ratings_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<u8>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .values()
            .filter(|r| r.doctor_id == Some(doctor_id))
            .map(|r| r.rating)
            .collect())
    }
}
