use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{ClinicStore, StoreError};
use shared_models::appointment::{AppointmentFilter, AppointmentStatus};
use shared_models::auth::Role;
use shared_models::pagination::{PageRequest, MAX_LIMIT};
use shared_models::user::{UserFilter, UserRecord};

/// Picks a doctor for a new booking by specialty and current workload.
pub struct DoctorMatchingService {
    store: Arc<dyn ClinicStore>,
}

impl DoctorMatchingService {
    pub fn new(store: Arc<dyn ClinicStore>) -> Self {
        Self { store }
    }

    async fn doctors_with_specialty(&self, specialty: &str) -> Result<Vec<UserRecord>, StoreError> {
        let filter = UserFilter {
            role: Some(Role::Doctor),
            specialty: Some(specialty.to_string()),
            ..Default::default()
        };

        let mut doctors = Vec::new();
        let mut page = PageRequest { page: 1, limit: MAX_LIMIT };
        loop {
            let batch = self.store.list_users(&filter, page).await?;
            let fetched = batch.items.len();
            doctors.extend(batch.items);

            if fetched == 0 || doctors.len() as u64 >= batch.total {
                break;
            }
            page.page += 1;
        }

        Ok(doctors)
    }

    /// PENDING plus CONFIRMED appointments assigned to the doctor.
    pub async fn open_load(&self, doctor_id: Uuid) -> Result<u64, StoreError> {
        let filter = AppointmentFilter {
            doctor_id: Some(doctor_id),
            ..Default::default()
        };

        let pending = self
            .store
            .count_appointments(&filter.clone().with_status(AppointmentStatus::Pending))
            .await?;
        let confirmed = self
            .store
            .count_appointments(&filter.with_status(AppointmentStatus::Confirmed))
            .await?;

        Ok(pending + confirmed)
    }

    /// The least-loaded doctor whose specialty matches case-insensitively.
    /// Ties go to the first doctor by name. `None` when nobody matches.
    pub async fn pick_doctor(&self, specialty: &str) -> Result<Option<Uuid>, StoreError> {
        let candidates = self.doctors_with_specialty(specialty).await?;
        debug!("Found {} {} doctors", candidates.len(), specialty);

        let mut best: Option<(Uuid, u64)> = None;
        for doctor in candidates {
            let load = self.open_load(doctor.id).await?;
            if best.map_or(true, |(_, best_load)| load < best_load) {
                best = Some((doctor.id, load));
            }
        }

        if let Some((doctor_id, load)) = best {
            info!("Matched {} request to doctor {} ({} open)", specialty, doctor_id, load);
        }

        Ok(best.map(|(doctor_id, _)| doctor_id))
    }
}
