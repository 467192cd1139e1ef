use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
    domain::entities::{PlanTier, user::UserRole},
};

/// Caller resolved by [`auth_middleware`], available to handlers as an extractor.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub plan: PlanTier,
}

impl CurrentUser {
    pub fn require_admin(&self) -> AppResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::InvalidCredentials)
    }
}

/// Authenticate the bearer token, load the profile, then apply the per-user
/// rate limit and count the call.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(jwt::bearer_token)
        .ok_or(AppError::InvalidCredentials)?;

    let claims = jwt::verify(token, &app_state.config.supabase_jwt_secret)?;
    let user_id = claims.user_id()?;
    let email = claims.email.unwrap_or_default();

    let profile = app_state
        .user_use_cases
        .ensure_profile(user_id, &email)
        .await?;

    let limit = profile.plan.limits().api_calls_per_minute;
    app_state
        .rate_limiter
        .check(&user_id.to_string(), limit)
        .await?;

    app_state.usage_use_cases.track_api_call(user_id).await;

    tracing::debug!(%user_id, plan = %profile.plan, "Authenticated request");

    request.extensions_mut().insert(CurrentUser {
        id: profile.id,
        email: profile.email,
        role: profile.role,
        plan: profile.plan,
    });

    Ok(next.run(request).await)
}
