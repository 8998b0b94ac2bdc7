use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{AppState, ClinicStore};
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::User;
use shared_models::pagination::{PageRequest, Pagination};
use shared_models::prescription::{Prescription, PrescriptionChanges, PrescriptionFilter};

use crate::models::{CreatePrescriptionRequest, PrescriptionBody, PrescriptionError};
use crate::services::validation::validate_body;

/// Doctors write prescriptions for appointments they completed; patients
/// read the ones written for them.
pub struct PrescriptionService {
    store: Arc<dyn ClinicStore>,
}

impl PrescriptionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: Arc::clone(&state.store),
        }
    }

    fn visibility_filter(actor: &User) -> PrescriptionFilter {
        if actor.is_doctor() {
            PrescriptionFilter { doctor_id: Some(actor.id), ..Default::default() }
        } else {
            PrescriptionFilter { patient_id: Some(actor.id), ..Default::default() }
        }
    }

    fn changes(body: PrescriptionBody) -> PrescriptionChanges {
        PrescriptionChanges {
            diagnosis: body.diagnosis.trim().to_string(),
            medications: body.medications,
            follow_up_instructions: body.follow_up_instructions.trim().to_string(),
            next_appointment: body.next_appointment,
        }
    }

    pub async fn create_prescription(
        &self,
        actor: &User,
        request: CreatePrescriptionRequest,
    ) -> Result<Prescription, PrescriptionError> {
        if !actor.is_doctor() {
            return Err(PrescriptionError::DoctorOnly("create prescriptions"));
        }

        let now = Utc::now();
        validate_body(&request.body, now)?;

        let appointment = self
            .store
            .find_appointment(request.appointment_id)
            .await?
            .filter(|a| a.doctor_id == Some(actor.id) && a.status == AppointmentStatus::Completed)
            .ok_or(PrescriptionError::AppointmentNotEligible)?;

        if self
            .store
            .find_prescription_for_appointment(appointment.id)
            .await?
            .is_some()
        {
            return Err(PrescriptionError::AlreadyExists);
        }

        let changes = Self::changes(request.body);
        let prescription = Prescription {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            doctor_id: actor.id,
            patient_id: appointment.patient_id,
            diagnosis: changes.diagnosis,
            medications: changes.medications,
            follow_up_instructions: changes.follow_up_instructions,
            next_appointment: changes.next_appointment,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_prescription(prescription).await?;
        info!(
            "Prescription {} written for appointment {} by doctor {}",
            created.id, created.appointment_id, actor.id
        );
        Ok(created)
    }

    pub async fn list_prescriptions(
        &self,
        actor: &User,
        page: PageRequest,
    ) -> Result<(Vec<Prescription>, Pagination), PrescriptionError> {
        let filter = Self::visibility_filter(actor);
        let result = self.store.list_prescriptions(&filter, page).await?;
        debug!("Listed {} of {} prescriptions for {}", result.items.len(), result.total, actor.id);

        Ok((result.items, Pagination::new(page, result.total)))
    }

    pub async fn get_prescription(&self, actor: &User, id: Uuid) -> Result<Prescription, PrescriptionError> {
        let filter = Self::visibility_filter(actor);
        self.store
            .find_prescription(id)
            .await?
            .filter(|p| filter.matches(p))
            .ok_or(PrescriptionError::NotFound)
    }

    pub async fn update_prescription(
        &self,
        actor: &User,
        id: Uuid,
        body: PrescriptionBody,
    ) -> Result<Prescription, PrescriptionError> {
        if !actor.is_doctor() {
            return Err(PrescriptionError::DoctorOnly("update prescriptions"));
        }
        validate_body(&body, Utc::now())?;

        match self.store.replace_prescription(id, actor.id, Self::changes(body)).await? {
            Some(updated) => {
                info!("Prescription {} updated by doctor {}", id, actor.id);
                Ok(updated)
            }
            None => Err(PrescriptionError::NotOwned("update")),
        }
    }

    pub async fn delete_prescription(&self, actor: &User, id: Uuid) -> Result<(), PrescriptionError> {
        if !actor.is_doctor() {
            return Err(PrescriptionError::DoctorOnly("delete prescriptions"));
        }

        if !self.store.delete_prescription(id, actor.id).await? {
            warn!("Doctor {} tried to delete prescription {} it does not own", actor.id, id);
            return Err(PrescriptionError::NotOwned("delete"));
        }

        info!("Prescription {} deleted by doctor {}", id, actor.id);
        Ok(())
    }
}
