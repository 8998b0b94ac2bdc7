use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extract::{JsonBody, PathParam, QueryParams, WithRejection};
use shared_models::pagination::PageRequest;

use crate::models::{CreatePrescriptionRequest, PrescriptionBody, PrescriptionListQuery};
use crate::services::prescription::PrescriptionService;

#[axum::debug_handler]
pub async fn create_prescription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Json(request), _): JsonBody<CreatePrescriptionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = PrescriptionService::new(&state);
    let prescription = service.create_prescription(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Prescription created successfully",
            "data": { "prescription": prescription }
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_prescriptions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Query(query), _): QueryParams<PrescriptionListQuery>,
) -> Result<Json<Value>, AppError> {
    let page = PageRequest::new(query.page, query.limit)?;

    let service = PrescriptionService::new(&state);
    let (prescriptions, pagination) = service.list_prescriptions(&user, page).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "prescriptions": prescriptions,
            "pagination": pagination
        }
    })))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(prescription_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = PrescriptionService::new(&state);
    let prescription = service.get_prescription(&user, prescription_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "prescription": prescription }
    })))
}

#[axum::debug_handler]
pub async fn update_prescription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(prescription_id), _): PathParam<Uuid>,
    WithRejection(Json(body), _): JsonBody<PrescriptionBody>,
) -> Result<Json<Value>, AppError> {
    let service = PrescriptionService::new(&state);
    let prescription = service.update_prescription(&user, prescription_id, body).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Prescription updated successfully",
        "data": { "prescription": prescription }
    })))
}

#[axum::debug_handler]
pub async fn delete_prescription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(prescription_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = PrescriptionService::new(&state);
    service.delete_prescription(&user, prescription_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Prescription deleted successfully"
    })))
}
