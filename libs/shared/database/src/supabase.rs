use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::appointment::{
    Appointment, AppointmentFilter, AppointmentGuard, AppointmentPatch, AppointmentStatus,
};
use shared_models::pagination::{Page, PageRequest};
use shared_models::prescription::{Prescription, PrescriptionChanges, PrescriptionFilter};
use shared_models::review::{Review, ReviewChanges, ReviewFilter};
use shared_models::user::{UserChanges, UserFilter, UserRecord};

use crate::error::StoreError;
use crate::store::ClinicStore;

/// Thin PostgREST client authenticated with the service-role key.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| StoreError::Backend("Supabase key is not a valid header value".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| StoreError::Backend("Supabase key is not a valid header value".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response, StoreError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => StoreError::Conflict(error_text),
                StatusCode::NOT_FOUND => StoreError::NotFound(error_text),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    StoreError::Backend(format!("Authentication error: {}", error_text))
                }
                _ => StoreError::Backend(format!("API error ({}): {}", status, error_text)),
            });
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, headers).await?;
        Ok(response.json::<T>().await?)
    }

    /// Writes and returns the affected rows (`Prefer: return=representation`).
    pub async fn write<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        self.request_with_headers(method, path, body, Some(headers)).await
    }

    /// Reads rows together with the exact count of the unpaginated query.
    pub async fn select_page<T>(&self, path: &str) -> Result<(Vec<T>, u64), StoreError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.send(Method::GET, path, None, Some(headers)).await?;
        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let rows: Vec<T> = response.json().await?;
        let total = parse_total(range.as_deref()).unwrap_or(rows.len() as u64);

        Ok((rows, total))
    }

}

/// `Content-Range: 0-9/42` or `*/0` → 42 / 0.
fn parse_total(content_range: Option<&str>) -> Option<u64> {
    content_range?
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
}

fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn page_params(page: PageRequest) -> String {
    format!("&limit={}&offset={}", page.limit, page.offset())
}

/// Escapes `LIKE` metacharacters so the text only matches itself.
fn like_literal(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Substring pattern for `ilike` inside `or=(...)`. The value is
/// double-quoted so `.`, `,` and parentheses stay literal.
fn search_term(raw: &str) -> String {
    let pattern = format!("*{}*", like_literal(raw));
    let quoted = pattern.replace('\\', "\\\\").replace('"', "\\\"");
    urlencoding::encode(&format!("\"{}\"", quoted)).into_owned()
}

fn stamped(body: impl Serialize) -> Result<Value, StoreError> {
    let mut value = serde_json::to_value(body)?;
    if let Value::Object(map) = &mut value {
        map.insert("updated_at".to_string(), json!(ts(Utc::now())));
    }
    Ok(value)
}

fn first<T>(rows: Vec<T>) -> Option<T> {
    rows.into_iter().next()
}

fn appointment_params(filter: &AppointmentFilter) -> String {
    let mut params = String::new();
    if let Some(id) = filter.patient_id {
        params.push_str(&format!("&patient_id=eq.{}", id));
    }
    if let Some(id) = filter.doctor_id {
        params.push_str(&format!("&doctor_id=eq.{}", id));
    }
    if let Some(status) = filter.status {
        params.push_str(&format!("&status=eq.{}", status));
    }
    if let Some(from) = filter.date_from {
        params.push_str(&format!("&date=gte.{}", ts(from)));
    }
    if let Some(to) = filter.date_to {
        params.push_str(&format!("&date=lt.{}", ts(to)));
    }
    params
}

fn guard_params(guard: &AppointmentGuard) -> String {
    let doctor = match guard.doctor_id {
        Some(id) => format!("eq.{}", id),
        None => "is.null".to_string(),
    };
    format!("&status=eq.{}&doctor_id={}", guard.status, doctor)
}

#[derive(Deserialize)]
struct RatingRow {
    rating: u8,
}

/// [`ClinicStore`] backed by Supabase tables over PostgREST.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl ClinicStore for SupabaseStore {
    async fn insert_user(&self, user: UserRecord) -> Result<UserRecord, StoreError> {
        let rows = self
            .supabase
            .write(Method::POST, "/rest/v1/users", Some(serde_json::to_value(&user)?))
            .await?;
        first(rows).ok_or_else(|| StoreError::Backend("Insert returned no user".to_string()))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let path = format!("/rest/v1/users?id=eq.{}&limit=1", id);
        let rows: Vec<UserRecord> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(first(rows))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let path = format!("/rest/v1/users?email=eq.{}&limit=1", urlencoding::encode(email));
        let rows: Vec<UserRecord> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(first(rows))
    }

    async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<UserRecord>, StoreError> {
        let mut path = "/rest/v1/users?select=*&order=name.asc".to_string();
        if let Some(role) = filter.role {
            path.push_str(&format!("&role=eq.{}", role));
        }
        if let Some(term) = filter.search.as_deref().filter(|t| !t.trim().is_empty()) {
            path.push_str(&format!("&or=(name.ilike.{0},email.ilike.{0})", search_term(term)));
        }
        if let Some(specialty) = filter.specialty.as_deref() {
            let exact = like_literal(specialty);
            path.push_str(&format!("&specialty=ilike.{}", urlencoding::encode(&exact)));
        }
        path.push_str(&page_params(page));

        let (items, total) = self.supabase.select_page(&path).await?;
        Ok(Page { items, total })
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<UserRecord>, StoreError> {
        let path = format!("/rest/v1/users?id=eq.{}", id);
        let rows = self
            .supabase
            .write(Method::PATCH, &path, Some(stamped(&changes)?))
            .await?;
        Ok(first(rows))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let path = format!("/rest/v1/users?id=eq.{}", id);
        let rows: Vec<Value> = self.supabase.write(Method::DELETE, &path, None).await?;
        Ok(!rows.is_empty())
    }

    async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError> {
        let rows = self
            .supabase
            .write(Method::POST, "/rest/v1/appointments", Some(serde_json::to_value(&appointment)?))
            .await?;
        first(rows).ok_or_else(|| StoreError::Backend("Insert returned no appointment".to_string()))
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&limit=1", id);
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(first(rows))
    }

    async fn list_appointments(&self, filter: &AppointmentFilter, page: PageRequest) -> Result<Page<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?select=*{}&order=date.asc,created_at.asc{}",
            appointment_params(filter),
            page_params(page)
        );
        let (items, total) = self.supabase.select_page(&path).await?;
        Ok(Page { items, total })
    }

    async fn count_appointments(&self, filter: &AppointmentFilter) -> Result<u64, StoreError> {
        let path = format!("/rest/v1/appointments?select=id{}&limit=1", appointment_params(filter));
        let (_, total) = self.supabase.select_page::<Value>(&path).await?;
        Ok(total)
    }

    async fn count_appointments_involving(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let path = format!(
            "/rest/v1/appointments?select=id&or=(patient_id.eq.{0},doctor_id.eq.{0})&limit=1",
            user_id
        );
        let (_, total) = self.supabase.select_page::<Value>(&path).await?;
        Ok(total)
    }

    async fn assign_doctor(&self, id: Uuid, doctor_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        // Single conditional UPDATE; PostgREST returns no rows if the guard failed.
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&doctor_id=is.null&status=eq.{}",
            id,
            AppointmentStatus::Pending
        );
        let body = stamped(json!({
            "doctor_id": doctor_id,
            "status": AppointmentStatus::Confirmed,
        }))?;
        let rows = self.supabase.write(Method::PATCH, &path, Some(body)).await?;
        Ok(first(rows))
    }

    async fn update_appointment(
        &self,
        id: Uuid,
        guard: AppointmentGuard,
        patch: AppointmentPatch,
    ) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}{}", id, guard_params(&guard));
        let rows = self
            .supabase
            .write(Method::PATCH, &path, Some(stamped(&patch)?))
            .await?;
        Ok(first(rows))
    }

    async fn insert_prescription(&self, prescription: Prescription) -> Result<Prescription, StoreError> {
        let rows = self
            .supabase
            .write(Method::POST, "/rest/v1/prescriptions", Some(serde_json::to_value(&prescription)?))
            .await?;
        first(rows).ok_or_else(|| StoreError::Backend("Insert returned no prescription".to_string()))
    }

    async fn find_prescription(&self, id: Uuid) -> Result<Option<Prescription>, StoreError> {
        let path = format!("/rest/v1/prescriptions?id=eq.{}&limit=1", id);
        let rows: Vec<Prescription> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(first(rows))
    }

    async fn find_prescription_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Prescription>, StoreError> {
        let path = format!("/rest/v1/prescriptions?appointment_id=eq.{}&limit=1", appointment_id);
        let rows: Vec<Prescription> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(first(rows))
    }

    async fn list_prescriptions(&self, filter: &PrescriptionFilter, page: PageRequest) -> Result<Page<Prescription>, StoreError> {
        let mut path = "/rest/v1/prescriptions?select=*&order=created_at.desc".to_string();
        if let Some(id) = filter.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", id));
        }
        if let Some(id) = filter.patient_id {
            path.push_str(&format!("&patient_id=eq.{}", id));
        }
        path.push_str(&page_params(page));

        let (items, total) = self.supabase.select_page(&path).await?;
        Ok(Page { items, total })
    }

    async fn replace_prescription(
        &self,
        id: Uuid,
        doctor_id: Uuid,
        changes: PrescriptionChanges,
    ) -> Result<Option<Prescription>, StoreError> {
        let path = format!("/rest/v1/prescriptions?id=eq.{}&doctor_id=eq.{}", id, doctor_id);
        let rows = self
            .supabase
            .write(Method::PATCH, &path, Some(stamped(&changes)?))
            .await?;
        Ok(first(rows))
    }

    async fn delete_prescription(&self, id: Uuid, doctor_id: Uuid) -> Result<bool, StoreError> {
        let path = format!("/rest/v1/prescriptions?id=eq.{}&doctor_id=eq.{}", id, doctor_id);
        let rows: Vec<Value> = self.supabase.write(Method::DELETE, &path, None).await?;
        Ok(!rows.is_empty())
    }

    async fn insert_review(&self, review: Review) -> Result<Review, StoreError> {
        let rows = self
            .supabase
            .write(Method::POST, "/rest/v1/reviews", Some(serde_json::to_value(&review)?))
            .await?;
        first(rows).ok_or_else(|| StoreError::Backend("Insert returned no review".to_string()))
    }

    async fn find_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        let path = format!("/rest/v1/reviews?id=eq.{}&limit=1", id);
        let rows: Vec<Review> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(first(rows))
    }

    async fn find_review_for_appointment(&self, appointment_id: Uuid) -> Result<Option<Review>, StoreError> {
        let path = format!("/rest/v1/reviews?appointment_id=eq.{}&limit=1", appointment_id);
        let rows: Vec<Review> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(first(rows))
    }

    async fn list_reviews(&self, filter: &ReviewFilter, page: PageRequest) -> Result<Page<Review>, StoreError> {
        let mut path = "/rest/v1/reviews?select=*&order=created_at.desc".to_string();
        if let Some(id) = filter.patient_id {
            path.push_str(&format!("&patient_id=eq.{}", id));
        }
        if let Some(id) = filter.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", id));
        }
        path.push_str(&page_params(page));

        let (items, total) = self.supabase.select_page(&path).await?;
        Ok(Page { items, total })
    }

    async fn update_review(&self, id: Uuid, patient_id: Uuid, changes: ReviewChanges) -> Result<Option<Review>, StoreError> {
        let path = format!("/rest/v1/reviews?id=eq.{}&patient_id=eq.{}", id, patient_id);
        let rows = self
            .supabase
            .write(Method::PATCH, &path, Some(stamped(&changes)?))
            .await?;
        Ok(first(rows))
    }

    async fn delete_review(&self, id: Uuid, patient_id: Uuid) -> Result<bool, StoreError> {
        let path = format!("/rest/v1/reviews?id=eq.{}&patient_id=eq.{}", id, patient_id);
        let rows: Vec<Value> = self.supabase.write(Method::DELETE, &path, None).await?;
        Ok(!rows.is_empty())
    }

    async fn ratings_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<u8>, StoreError> {
        let path = format!("/rest/v1/reviews?select=rating&doctor_id=eq.{}", doctor_id);
        let rows: Vec<RatingRow> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().map(|row| row.rating).collect())
    }
}
