use shared_models::error::AppError;
use shared_utils::validation::check_length;

use crate::models::ReviewBody;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Returns the rating narrowed to its stored width.
pub fn validate_body(body: &ReviewBody) -> Result<u8, AppError> {
    let rating = match body.rating {
        None => return Err(AppError::ValidationError("Rating is required".to_string())),
        Some(r) if r < MIN_RATING => {
            return Err(AppError::ValidationError(format!("Rating must be at least {}", MIN_RATING)))
        }
        Some(r) if r > MAX_RATING => {
            return Err(AppError::ValidationError(format!("Rating cannot exceed {}", MAX_RATING)))
        }
        Some(r) => r,
    };

    check_length("Comment", &body.comment, 10, 500)?;

    u8::try_from(rating).map_err(|_| AppError::ValidationError("Rating is out of range".to_string()))
}
