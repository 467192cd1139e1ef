//! Stripe checkout, portal and webhook endpoints.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    adapters::http::{app_state::AppState, middleware::CurrentUser, response::ok},
    app_error::{AppError, AppResult},
    application::ports::billing_gateway::WebhookEvent,
    infra::stripe_client::StripeClient,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/portal", post(create_portal))
        .route("/subscription", get(get_subscription))
}

#[derive(Serialize)]
struct RedirectResponse {
    url: String,
}

/// POST /api/stripe/checkout
async fn create_checkout(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let account = app_state.user_use_cases.get_account(user.id).await?;
    let url = app_state
        .billing_use_cases
        .create_checkout(&account.profile)
        .await?;
    Ok(ok(RedirectResponse { url }))
}

/// POST /api/stripe/portal
async fn create_portal(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let url = app_state.billing_use_cases.create_portal(user.id).await?;
    Ok(ok(RedirectResponse { url }))
}

/// GET /api/stripe/subscription
async fn get_subscription(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let subscription = app_state
        .billing_use_cases
        .get_subscription(user.id)
        .await?;
    Ok(ok(subscription))
}

/// Determines if a webhook processing error should trigger a Stripe retry.
///
/// Transient failures return 5xx so Stripe redelivers; expected conditions
/// (unknown customer, malformed object) are acknowledged with 2xx.
fn is_retryable_error(error: &AppError) -> bool {
    match error {
        // Transient errors - retry may succeed
        AppError::Database(_) => true,
        AppError::Internal(_) => true,
        AppError::RateLimited { .. } => true,

        // Expected conditions - won't change with retry
        AppError::NotFound => false,
        AppError::InvalidInput(_) => false,
        AppError::InvalidCredentials => false,
        AppError::Forbidden => false,
        AppError::PlanLimitExceeded(_) => false,
        AppError::PremiumRequired => false,
        AppError::PayloadTooLarge => false,
    }
}

/// POST /api/stripe/webhook
pub async fn handle_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<StatusCode> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidInput("Missing Stripe signature".into()))?;

    StripeClient::verify_webhook_signature(
        &body,
        signature,
        &app_state.config.stripe_webhook_secret,
    )?;

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

    match app_state
        .billing_use_cases
        .process_webhook_event(&event)
        .await
    {
        Ok(outcome) => {
            info!(event_id = %event.id, event_type = %event.event_type, ?outcome, "Webhook handled");
            Ok(StatusCode::OK)
        }
        Err(e) if is_retryable_error(&e) => {
            error!(
                error = %e,
                event_id = %event.id,
                event_type = %event.event_type,
                retryable = true,
                "Webhook processing failed, returning 500 for Stripe retry"
            );
            Ok(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            warn!(
                error = %e,
                event_id = %event.id,
                event_type = %event.event_type,
                retryable = false,
                "Webhook event could not be applied, acknowledging"
            );
            Ok(StatusCode::OK)
        }
    }
}
