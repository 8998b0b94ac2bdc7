//! Request extractors whose rejections render as `AppError` envelopes
//! instead of axum's plain-text 400/422 bodies.

use axum::extract::{Path, Query};
use axum::Json;
use shared_models::error::AppError;

pub use axum_extra::extract::WithRejection;

pub type JsonBody<T> = WithRejection<Json<T>, AppError>;
pub type PathParam<T> = WithRejection<Path<T>, AppError>;
pub type QueryParams<T> = WithRejection<Query<T>, AppError>;
