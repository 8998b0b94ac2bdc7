//! Who may see and who may cancel an appointment.
//!
//! Patients see their own appointments. Doctors work from a shared pool and
//! see every appointment, assigned or not.

use shared_models::appointment::{Appointment, AppointmentFilter};
use shared_models::auth::{Role, User};

pub fn can_view(actor: &User, appointment: &Appointment) -> bool {
    match actor.role {
        Role::Patient => appointment.patient_id == actor.id,
        Role::Doctor => true,
    }
}

/// The store-side equivalent of [`can_view`], used by list and dashboard.
pub fn visibility_filter(actor: &User) -> AppointmentFilter {
    match actor.role {
        Role::Patient => AppointmentFilter {
            patient_id: Some(actor.id),
            ..Default::default()
        },
        Role::Doctor => AppointmentFilter::default(),
    }
}

/// The booking patient, or the doctor the appointment is assigned to.
pub fn can_cancel(actor: &User, appointment: &Appointment) -> bool {
    match actor.role {
        Role::Patient => appointment.patient_id == actor.id,
        Role::Doctor => appointment.doctor_id == Some(actor.id),
    }
}
