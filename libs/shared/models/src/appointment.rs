use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("Unknown appointment status: {}", value))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "LOW"),
            Priority::Medium => write!(f, "MEDIUM"),
            Priority::High => write!(f, "HIGH"),
        }
    }
}

/// A row of the `appointments` table. Appointments are never deleted;
/// cancelling one only moves it to `CANCELLED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub pet_name: String,
    pub animal_type: String,
    pub breed: String,
    pub pet_age: String,
    pub reason: String,
    pub doctor_specialty: String,
    pub date: DateTime<Utc>,
    pub time: String,
    pub additional_notes: Option<String>,
    pub priority: Priority,
    pub status: AppointmentStatus,
    pub doctor_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns a conditional update may write. `None` leaves the column as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<Uuid>,
}

/// The row state an update was computed from. The store applies the patch
/// only while the row still has exactly this status and doctor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppointmentGuard {
    pub status: AppointmentStatus,
    pub doctor_id: Option<Uuid>,
}

impl From<&Appointment> for AppointmentGuard {
    fn from(appointment: &Appointment) -> Self {
        Self {
            status: appointment.status,
            doctor_id: appointment.doctor_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    /// Inclusive lower bound on `date`.
    pub date_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `date`.
    pub date_to: Option<DateTime<Utc>>,
}

impl AppointmentFilter {
    pub fn with_status(mut self, status: AppointmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.doctor_id.map_or(true, |id| appointment.doctor_id == Some(id))
            && self.status.map_or(true, |status| appointment.status == status)
            && self.date_from.map_or(true, |from| appointment.date >= from)
            && self.date_to.map_or(true, |to| appointment.date < to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_upper_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
        assert_eq!("completed".parse::<AppointmentStatus>(), Ok(AppointmentStatus::Completed));
        assert!("NO_SHOW".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn only_completed_and_cancelled_are_terminal() {
        assert!(!AppointmentStatus::Pending.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        let parsed: Priority = serde_json::from_str("\"HIGH\"").unwrap();
        assert_eq!(parsed, Priority::High);
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let json = serde_json::to_value(AppointmentPatch::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
