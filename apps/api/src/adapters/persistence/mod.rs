use sqlx::{PgPool, error::ErrorKind};

use crate::app_error::AppError;

pub mod model;
pub mod monthly_data;
pub mod sale;
pub mod subscription;
pub mod usage;
pub mod user;
pub mod webhook_event;

/// Characters of a rejected JSONB value kept in the warning log.
const MAX_JSON_LOG_CHARS: usize = 200;

/// Decode a JSONB column, falling back to `T::default()` when the stored value
/// no longer matches the current shape.
///
/// SQL NULL decodes to the default silently. Anything else that fails to
/// decode is logged with a truncated copy of the raw value so a corrupted
/// month shows up in the logs without failing the whole listing.
pub fn parse_json_with_fallback<T: serde::de::DeserializeOwned + Default>(
    json: &serde_json::Value,
    field_name: &str,
    entity_type: &str,
    entity_id: &str,
) -> T {
    if json.is_null() {
        return T::default();
    }

    match <T as serde::Deserialize>::deserialize(json) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(
                field = field_name,
                entity_type,
                entity_id,
                raw_json = %truncate_for_log(&json.to_string()),
                error = %err,
                "Stored JSON does not decode, using default value"
            );
            T::default()
        }
    }
}

fn truncate_for_log(raw: &str) -> String {
    match raw.char_indices().nth(MAX_JSON_LOG_CHARS) {
        Some((cut, _)) => format!("{}...", &raw[..cut]),
        None => raw.to_string(),
    }
}

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    AppError::InvalidInput("A record with this name or period already exists".into())
                }
                ErrorKind::ForeignKeyViolation => {
                    AppError::InvalidInput("Referenced user or model does not exist".into())
                }
                ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                    AppError::InvalidInput("Record is missing a value or has one out of range".into())
                }
                _ => {
                    tracing::error!(error = %db_err, constraint = ?db_err.constraint(), "Database error");
                    AppError::Database("Database operation failed".into())
                }
            },
            _ => {
                tracing::error!(error = %err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
