use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        match &self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = ?self, "Request failed")
            }
            _ => tracing::warn!(error = %self, "Request rejected"),
        }

        match self {
            AppError::Database(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError, None)
            }
            AppError::InvalidCredentials => {
                error_resp(StatusCode::UNAUTHORIZED, ErrorCode::InvalidCredentials, None)
            }
            AppError::Forbidden => error_resp(StatusCode::FORBIDDEN, ErrorCode::Forbidden, None),
            AppError::PlanLimitExceeded(msg) => {
                error_resp(StatusCode::FORBIDDEN, ErrorCode::PlanLimitExceeded, Some(msg))
            }
            AppError::PremiumRequired => {
                error_resp(StatusCode::FORBIDDEN, ErrorCode::PremiumRequired, None)
            }
            AppError::RateLimited { retry_after_secs } => {
                let mut resp =
                    error_resp(StatusCode::TOO_MANY_REQUESTS, ErrorCode::RateLimited, None);
                if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    resp.headers_mut().insert(header::RETRY_AFTER, value);
                }
                resp
            }
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None),
            AppError::PayloadTooLarge => {
                error_resp(StatusCode::PAYLOAD_TOO_LARGE, ErrorCode::PayloadTooLarge, None)
            }
            AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, None)
            }
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let error = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (
        status,
        Json(serde_json::json!({ "success": false, "error": error })),
    )
        .into_response()
}
