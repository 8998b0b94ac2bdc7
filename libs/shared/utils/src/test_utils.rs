use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, DoctorAssignment, StoreBackend};
use shared_database::AppState;
use shared_models::appointment::{Appointment, AppointmentStatus, Priority};
use shared_models::auth::{Role, User};
use shared_models::user::UserRecord;

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub doctor_assignment: DoctorAssignment,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            doctor_assignment: DoctorAssignment::Unassigned,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            jwt_secret: self.jwt_secret.clone(),
            jwt_ttl_hours: 1,
            store_backend: StoreBackend::Memory,
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            doctor_assignment: self.doctor_assignment,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    /// Fresh in-memory state; every call gets empty tables.
    pub fn to_state(&self) -> Arc<AppState> {
        Arc::new(AppState::in_memory(self.to_app_config()))
    }
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            issued_at: Some(Utc::now()),
        }
    }

    /// A stored row for this user. The hash is a placeholder; use
    /// [`crate::password::hash_password`] when a test logs in.
    pub fn to_record(&self) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            password_hash: String::new(),
            phone: None,
            role: self.role,
            specialty: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn token(&self, secret: &str) -> String {
        issue_token(self.id, &self.email, self.role, secret, 1)
            .map(|issued| issued.token)
            .unwrap_or_default()
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
            return Self::create_malformed_token();
        };
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// A PENDING, unassigned appointment two days out.
pub fn appointment_record(patient_id: Uuid) -> Appointment {
    let now = Utc::now();
    Appointment {
        id: Uuid::new_v4(),
        patient_id,
        doctor_id: None,
        pet_name: "Biscuit".to_string(),
        animal_type: "Dog".to_string(),
        breed: "Beagle".to_string(),
        pet_age: "4 years".to_string(),
        reason: "Limping on the front left leg".to_string(),
        doctor_specialty: "Orthopedics".to_string(),
        date: now + Duration::days(2),
        time: "10:30".to_string(),
        additional_notes: None,
        priority: Priority::Medium,
        status: AppointmentStatus::Pending,
        doctor_notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// A COMPLETED appointment handled by `doctor_id`.
pub fn completed_appointment(patient_id: Uuid, doctor_id: Uuid) -> Appointment {
    Appointment {
        doctor_id: Some(doctor_id),
        status: AppointmentStatus::Completed,
        ..appointment_record(patient_id)
    }
}
