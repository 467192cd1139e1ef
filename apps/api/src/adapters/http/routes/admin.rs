use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{AppJson, AppPath},
        middleware::CurrentUser,
        response::ok,
    },
    app_error::AppResult,
    domain::entities::PlanTier,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(get_overview))
        .route("/users", get(list_users))
        .route("/users/{user_id}/plan", patch(set_user_plan))
}

/// GET /api/admin/overview
async fn get_overview(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    user.require_admin()?;
    let overview = app_state.admin_use_cases.overview().await?;
    Ok(ok(overview))
}

/// GET /api/admin/users
async fn list_users(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    user.require_admin()?;
    let users = app_state.admin_use_cases.list_users().await?;
    Ok(ok(users))
}

#[derive(Deserialize)]
struct SetPlanPayload {
    plan: PlanTier,
}

/// PATCH /api/admin/users/{user_id}/plan
async fn set_user_plan(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(payload): AppJson<SetPlanPayload>,
) -> AppResult<impl IntoResponse> {
    user.require_admin()?;
    tracing::info!(admin_id = %user.id, target_user = %user_id, "Admin plan change requested");
    let updated = app_state
        .admin_use_cases
        .set_user_plan(user_id, payload.plan)
        .await?;
    Ok(ok(updated))
}
