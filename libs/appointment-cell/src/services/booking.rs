use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::{AppConfig, DoctorAssignment};
use shared_database::{AppState, ClinicStore};
use shared_models::appointment::{Appointment, AppointmentGuard, AppointmentPatch, AppointmentStatus};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::pagination::{PageRequest, Pagination};
use shared_models::user::UserChanges;
use shared_utils::validation::non_empty;

use crate::models::{AppointmentDetails, AppointmentError, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::matching::DoctorMatchingService;
use crate::services::policy;
use crate::services::validation::{validate_create, validate_update};

/// Create, read, assign, update and cancel appointments on behalf of an
/// authenticated actor.
pub struct AppointmentBookingService {
    store: Arc<dyn ClinicStore>,
    config: Arc<AppConfig>,
    lifecycle_service: AppointmentLifecycleService,
    doctor_matching_service: DoctorMatchingService,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: Arc::clone(&state.store),
            config: Arc::clone(&state.config),
            lifecycle_service: AppointmentLifecycleService::new(),
            doctor_matching_service: DoctorMatchingService::new(Arc::clone(&state.store)),
        }
    }

    pub async fn create_appointment(
        &self,
        actor: &User,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if !actor.is_patient() {
            return Err(AppointmentError::PatientOnly);
        }

        let now = Utc::now();
        validate_create(&request, now)?;
        let Some(date) = request.date else {
            return Err(AppError::ValidationError("Appointment date is required".to_string()).into());
        };

        if self.store.find_user(actor.id).await?.is_none() {
            return Err(AppointmentError::PatientNotFound);
        }
        let phone = request.phone.trim().to_string();

        let specialty = request.doctor_specialty.trim().to_string();
        let doctor_id = match self.config.doctor_assignment {
            DoctorAssignment::Unassigned => None,
            DoctorAssignment::Specialty => self.doctor_matching_service.pick_doctor(&specialty).await?,
        };

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: actor.id,
            doctor_id,
            pet_name: request.pet_name.trim().to_string(),
            animal_type: request.animal_type.trim().to_string(),
            breed: request.breed.trim().to_string(),
            pet_age: request.pet_age.trim().to_string(),
            reason: request.reason.trim().to_string(),
            doctor_specialty: specialty,
            date,
            time: request.time.trim().to_string(),
            additional_notes: non_empty(request.additional_notes),
            priority: request.priority.unwrap_or_default(),
            status: AppointmentStatus::Pending,
            doctor_notes: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_appointment(appointment).await?;
        info!("Appointment {} booked by patient {}", created.id, actor.id);

        // The booking form carries the patient's latest contact number; it is
        // saved only once the booking exists.
        let phone_update = UserChanges {
            phone: Some(phone),
            ..Default::default()
        };
        if self.store.update_user(actor.id, phone_update).await?.is_none() {
            warn!("Patient {} disappeared before their phone number was saved", actor.id);
        }

        Ok(created)
    }

    async fn details(&self, appointment: Appointment) -> Result<AppointmentDetails, AppointmentError> {
        let prescription = self.store.find_prescription_for_appointment(appointment.id).await?;
        let review = self.store.find_review_for_appointment(appointment.id).await?;

        Ok(AppointmentDetails {
            appointment,
            prescription,
            review,
        })
    }

    pub async fn list_appointments(
        &self,
        actor: &User,
        status: Option<AppointmentStatus>,
        page: PageRequest,
    ) -> Result<(Vec<AppointmentDetails>, Pagination), AppointmentError> {
        let mut filter = policy::visibility_filter(actor);
        filter.status = status;
        debug!("Listing appointments for {} {} with {:?}", actor.role, actor.id, filter);

        let rows = self.store.list_appointments(&filter, page).await?;
        let pagination = Pagination::new(page, rows.total);
        let details = try_join_all(rows.items.into_iter().map(|a| self.details(a))).await?;

        Ok((details, pagination))
    }

    pub async fn get_appointment(&self, actor: &User, id: Uuid) -> Result<AppointmentDetails, AppointmentError> {
        let appointment = self
            .store
            .find_appointment(id)
            .await?
            .filter(|a| policy::can_view(actor, a))
            .ok_or(AppointmentError::NotFound)?;

        self.details(appointment).await
    }

    /// Self-assignment by a doctor. One conditional write claims the
    /// appointment and confirms it; the loser of a race gets a conflict.
    pub async fn assign_doctor(&self, actor: &User, id: Uuid) -> Result<Appointment, AppointmentError> {
        if !actor.is_doctor() {
            return Err(AppointmentError::DoctorOnly("assign appointments"));
        }

        if let Some(claimed) = self.store.assign_doctor(id, actor.id).await? {
            info!("Appointment {} assigned to doctor {}", id, actor.id);
            return Ok(claimed);
        }

        match self.store.find_appointment(id).await? {
            None => Err(AppointmentError::NotFound),
            Some(current) if current.status.is_terminal() => Err(AppointmentError::Terminal(current.status)),
            Some(current) => {
                warn!(
                    "Doctor {} lost claim on appointment {} (doctor {:?}, {})",
                    actor.id, id, current.doctor_id, current.status
                );
                Err(AppointmentError::AlreadyAssigned)
            }
        }
    }

    /// Doctor edits of status, notes and priority. An unassigned appointment
    /// is assigned to the editing doctor in the same write.
    pub async fn update_appointment(
        &self,
        actor: &User,
        id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if !actor.is_doctor() {
            return Err(AppointmentError::DoctorOnly("update appointments"));
        }
        validate_update(&request)?;

        let current = self
            .store
            .find_appointment(id)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        self.lifecycle_service.validate_mutation(current.status, request.status)?;

        let patch = AppointmentPatch {
            status: request.status,
            doctor_notes: request.doctor_notes.map(|notes| notes.trim().to_string()),
            priority: request.priority,
            doctor_id: current.doctor_id.is_none().then_some(actor.id),
        };

        self.apply(&current, patch).await
    }

    pub async fn cancel_appointment(&self, actor: &User, id: Uuid) -> Result<Appointment, AppointmentError> {
        let current = self
            .store
            .find_appointment(id)
            .await?
            .filter(|a| policy::can_cancel(actor, a))
            .ok_or(AppointmentError::CancelNotPermitted)?;

        self.lifecycle_service
            .validate_status_transition(current.status, AppointmentStatus::Cancelled)?;

        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };

        self.apply(&current, patch).await
    }

    /// Writes `patch` only if the row still looks like `current`.
    async fn apply(&self, current: &Appointment, patch: AppointmentPatch) -> Result<Appointment, AppointmentError> {
        let guard = AppointmentGuard::from(current);

        match self.store.update_appointment(current.id, guard, patch).await? {
            Some(updated) => {
                info!(
                    "Appointment {} updated: {} -> {}",
                    updated.id, current.status, updated.status
                );
                Ok(updated)
            }
            None => match self.store.find_appointment(current.id).await? {
                None => Err(AppointmentError::NotFound),
                Some(_) => {
                    warn!("Concurrent modification of appointment {}", current.id);
                    Err(AppointmentError::ConcurrentModification)
                }
            },
        }
    }
}
