use std::sync::OnceLock;

use regex::Regex;

use shared_models::error::AppError;

pub const INVALID_EMAIL: &str = "INVALID_EMAIL";
pub const WEAK_PASSWORD: &str = "WEAK_PASSWORD";

pub const MIN_PASSWORD_LEN: usize = 6;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::ValidationError(message.into())
}

/// Checks the trimmed character count of `value`.
///
/// `label` is the human name used in messages ("Pet name", "Reason").
/// With `min == 1` a blank value reports "{label} is required".
pub fn check_length(label: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();

    if len == 0 && min > 0 {
        return Err(invalid(format!("{} is required", label)));
    }
    if len < min {
        return Err(invalid(format!("{} must be at least {} characters long", label, min)));
    }
    if len > max {
        return Err(invalid(format!("{} cannot exceed {} characters", label, max)));
    }
    Ok(())
}

pub fn check_max_length(label: &str, value: &str, max: usize) -> Result<(), AppError> {
    check_length(label, value, 0, max)
}

pub fn check_required(label: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{} is required", label)));
    }
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email_regex().is_some_and(|re| re.is_match(email.trim())) {
        Ok(())
    } else {
        Err(invalid("Please provide a valid email address").with_code(INVALID_EMAIL))
    }
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ))
        .with_code(WEAK_PASSWORD));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    check_length("Name", name, 2, 50)
}

pub fn validate_phone(phone: &str) -> Result<(), AppError> {
    let len = phone.trim().chars().count();
    if len == 0 {
        return Err(invalid("Phone number is required"));
    }
    if len < 10 {
        return Err(invalid("Phone number must be at least 10 digits"));
    }
    if len > 15 {
        return Err(invalid("Phone number cannot exceed 15 digits"));
    }
    Ok(())
}

pub fn validate_specialty(specialty: &str) -> Result<(), AppError> {
    check_max_length("Specialty", specialty, 100)
}

/// Trims and drops empty optional text.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
