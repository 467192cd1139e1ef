use crate::app_error::{AppError, AppResult};

pub const MAX_NAME_LEN: usize = 100;
pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

/// Trims and validates a display name (user or model).
/// Rules:
/// - 1-100 characters after trimming
/// - No control characters
pub fn validate_name(raw: &str, field: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(format!("{field} is required")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(AppError::InvalidInput(format!(
            "{field} contains invalid characters"
        )));
    }
    Ok(name.to_string())
}

/// Validates a (year, month) reporting period.
pub fn validate_period(year: i32, month: u32) -> AppResult<()> {
    if !(1..=12).contains(&month) {
        return Err(AppError::InvalidInput("Month must be between 1 and 12".into()));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(AppError::InvalidInput(format!(
            "Year must be between {MIN_YEAR} and {MAX_YEAR}"
        )));
    }
    Ok(())
}
