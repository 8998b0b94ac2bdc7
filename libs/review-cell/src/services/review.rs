use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{AppState, ClinicStore};
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::User;
use shared_models::pagination::{Page, PageRequest, Pagination};
use shared_models::review::{Review, ReviewChanges, ReviewFilter};

use crate::models::{CreateReviewRequest, DoctorReviewStats, ReviewBody, ReviewError};
use crate::services::stats::summarize;
use crate::services::validation::validate_body;

/// Patients review their completed appointments; doctors read the reviews
/// left on appointments they handled.
pub struct ReviewService {
    store: Arc<dyn ClinicStore>,
}

impl ReviewService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: Arc::clone(&state.store),
        }
    }

    /// `None` when the requested doctor filter can never match for this actor.
    fn visibility_filter(actor: &User, doctor_id: Option<Uuid>) -> Option<ReviewFilter> {
        if actor.is_doctor() {
            match doctor_id {
                Some(requested) if requested != actor.id => None,
                _ => Some(ReviewFilter { doctor_id: Some(actor.id), ..Default::default() }),
            }
        } else {
            Some(ReviewFilter { patient_id: Some(actor.id), doctor_id })
        }
    }

    pub async fn create_review(&self, actor: &User, request: CreateReviewRequest) -> Result<Review, ReviewError> {
        if !actor.is_patient() {
            return Err(ReviewError::PatientOnly("create reviews"));
        }

        let rating = validate_body(&request.body)?;

        let appointment = self
            .store
            .find_appointment(request.appointment_id)
            .await?
            .filter(|a| a.patient_id == actor.id && a.status == AppointmentStatus::Completed)
            .ok_or(ReviewError::AppointmentNotEligible)?;

        if self.store.find_review_for_appointment(appointment.id).await?.is_some() {
            return Err(ReviewError::AlreadyExists);
        }

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            patient_id: actor.id,
            doctor_id: appointment.doctor_id,
            rating,
            comment: request.body.comment.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        let created = self.store.insert_review(review).await?;
        info!("Review {} left on appointment {} by patient {}", created.id, created.appointment_id, actor.id);
        Ok(created)
    }

    pub async fn list_reviews(
        &self,
        actor: &User,
        doctor_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<(Vec<Review>, Pagination), ReviewError> {
        let result = match Self::visibility_filter(actor, doctor_id) {
            Some(filter) => self.store.list_reviews(&filter, page).await?,
            None => Page::empty(),
        };
        debug!("Listed {} of {} reviews for {}", result.items.len(), result.total, actor.id);

        Ok((result.items, Pagination::new(page, result.total)))
    }

    pub async fn get_review(&self, actor: &User, id: Uuid) -> Result<Review, ReviewError> {
        let filter = Self::visibility_filter(actor, None).ok_or(ReviewError::NotFound)?;
        self.store
            .find_review(id)
            .await?
            .filter(|r| filter.matches(r))
            .ok_or(ReviewError::NotFound)
    }

    pub async fn update_review(&self, actor: &User, id: Uuid, body: ReviewBody) -> Result<Review, ReviewError> {
        if !actor.is_patient() {
            return Err(ReviewError::PatientOnly("update reviews"));
        }
        let rating = validate_body(&body)?;

        let changes = ReviewChanges {
            rating,
            comment: body.comment.trim().to_string(),
        };
        match self.store.update_review(id, actor.id, changes).await? {
            Some(updated) => {
                info!("Review {} updated by patient {}", id, actor.id);
                Ok(updated)
            }
            None => Err(ReviewError::NotOwned("update")),
        }
    }

    pub async fn delete_review(&self, actor: &User, id: Uuid) -> Result<(), ReviewError> {
        if !actor.is_patient() {
            return Err(ReviewError::PatientOnly("delete reviews"));
        }

        if !self.store.delete_review(id, actor.id).await? {
            warn!("Patient {} tried to delete review {} it does not own", actor.id, id);
            return Err(ReviewError::NotOwned("delete"));
        }

        info!("Review {} deleted by patient {}", id, actor.id);
        Ok(())
    }

    pub async fn doctor_stats(&self, doctor_id: Uuid) -> Result<DoctorReviewStats, ReviewError> {
        let ratings = self.store.ratings_for_doctor(doctor_id).await?;
        Ok(summarize(&ratings))
    }
}
