use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extract::{JsonBody, PathParam, QueryParams, WithRejection};
use shared_models::pagination::PageRequest;

use crate::models::{AppointmentListQuery, CreateAppointmentRequest, UpdateAppointmentRequest};
use crate::services::booking::AppointmentBookingService;
use crate::services::dashboard::DashboardService;

/// `status=all` and an absent status both mean no filter.
fn parse_status_filter(raw: Option<&str>) -> Result<Option<AppointmentStatus>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value
            .parse::<AppointmentStatus>()
            .map(Some)
            .map_err(AppError::ValidationError),
    }
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Json(request), _): JsonBody<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service.create_appointment(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Appointment created successfully",
            "data": { "appointment": appointment }
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Query(query), _): QueryParams<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let status = parse_status_filter(query.status.as_deref())?;
    let page = PageRequest::new(query.page, query.limit)?;

    let service = AppointmentBookingService::new(&state);
    let (appointments, pagination) = service.list_appointments(&user, status, page).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "appointments": appointments,
            "pagination": pagination
        }
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(appointment_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service.get_appointment(&user, appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "appointment": appointment }
    })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(appointment_id), _): PathParam<Uuid>,
    WithRejection(Json(request), _): JsonBody<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service.update_appointment(&user, appointment_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment updated successfully",
        "data": { "appointment": appointment }
    })))
}

#[axum::debug_handler]
pub async fn assign_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(appointment_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service.assign_doctor(&user, appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment assigned successfully",
        "data": { "appointment": appointment }
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(appointment_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);
    let appointment = service.cancel_appointment(&user, appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled successfully",
        "data": { "appointment": appointment }
    })))
}

#[axum::debug_handler]
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = DashboardService::new(&state);
    let stats = service.dashboard_stats(&user).await?;

    Ok(Json(json!({
        "success": true,
        "data": stats
    })))
}
