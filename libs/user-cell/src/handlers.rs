use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extract::{JsonBody, PathParam, QueryParams, WithRejection};
use shared_models::pagination::PageRequest;

use crate::models::{DoctorListQuery, PatientListQuery, UpdatePasswordRequest, UpdateProfileRequest};
use crate::services::directory::DirectoryService;
use crate::services::profile::ProfileService;

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<User>,
    WithRejection(Query(query), _): QueryParams<DoctorListQuery>,
) -> Result<Json<Value>, AppError> {
    let page = PageRequest::new(query.page, query.limit)?;

    let service = DirectoryService::new(&state);
    let (doctors, pagination) = service.list_doctors(query.specialty, page).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "doctors": doctors,
            "pagination": pagination
        }
    })))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Query(query), _): QueryParams<PatientListQuery>,
) -> Result<Json<Value>, AppError> {
    let page = PageRequest::new(query.page, query.limit)?;

    let service = DirectoryService::new(&state);
    let (patients, pagination) = service.list_patients(&user, query.search, page).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "patients": patients,
            "pagination": pagination
        }
    })))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(user_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DirectoryService::new(&state);
    let profile = service.get_user(&user, user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "user": profile }
    })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(user_id), _): PathParam<Uuid>,
    WithRejection(Json(request), _): JsonBody<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    let profile = service.update_profile(&user, user_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "data": { "user": profile }
    })))
}

#[axum::debug_handler]
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(user_id), _): PathParam<Uuid>,
    WithRejection(Json(request), _): JsonBody<UpdatePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    service.update_password(&user, user_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(user_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&state);
    service.delete_account(&user, user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Account deleted successfully"
    })))
}
