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

use crate::models::{CreateReviewRequest, ReviewBody, ReviewListQuery};
use crate::services::review::ReviewService;

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Json(request), _): JsonBody<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ReviewService::new(&state);
    let review = service.create_review(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Review created successfully",
            "data": { "review": review }
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Query(query), _): QueryParams<ReviewListQuery>,
) -> Result<Json<Value>, AppError> {
    let page = PageRequest::new(query.page, query.limit)?;

    let service = ReviewService::new(&state);
    let (reviews, pagination) = service.list_reviews(&user, query.doctor_id, page).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "reviews": reviews,
            "pagination": pagination
        }
    })))
}

#[axum::debug_handler]
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(review_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReviewService::new(&state);
    let review = service.get_review(&user, review_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "review": review }
    })))
}

#[axum::debug_handler]
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(review_id), _): PathParam<Uuid>,
    WithRejection(Json(body), _): JsonBody<ReviewBody>,
) -> Result<Json<Value>, AppError> {
    let service = ReviewService::new(&state);
    let review = service.update_review(&user, review_id, body).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Review updated successfully",
        "data": { "review": review }
    })))
}

#[axum::debug_handler]
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    WithRejection(Path(review_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReviewService::new(&state);
    service.delete_review(&user, review_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Review deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn doctor_stats(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<User>,
    WithRejection(Path(doctor_id), _): PathParam<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReviewService::new(&state);
    let stats = service.doctor_stats(doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": stats
    })))
}
