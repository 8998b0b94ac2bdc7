use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

/// A row of the `prescriptions` table. `appointment_id` is unique, and
/// medications live in a JSON column so replacing them is one write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    pub medications: Vec<Medication>,
    pub follow_up_instructions: String,
    pub next_appointment: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement of the doctor-editable columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrescriptionChanges {
    pub diagnosis: String,
    pub medications: Vec<Medication>,
    pub follow_up_instructions: String,
    pub next_appointment: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrescriptionFilter {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
}

impl PrescriptionFilter {
    pub fn matches(&self, prescription: &Prescription) -> bool {
        self.doctor_id.map_or(true, |id| prescription.doctor_id == id)
            && self.patient_id.map_or(true, |id| prescription.patient_id == id)
    }
}
