use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `reviews` table. `appointment_id` is unique; `doctor_id`
/// is copied from the completed appointment when the review is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewChanges {
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        self.patient_id.map_or(true, |id| review.patient_id == id)
            && self.doctor_id.map_or(true, |id| review.doctor_id == Some(id))
    }
}
