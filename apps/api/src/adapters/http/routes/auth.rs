use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use crate::{
    adapters::http::{
        app_state::AppState, extract::AppJson, middleware::CurrentUser, response::ok,
    },
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/user", get(get_user).patch(update_user))
}

/// GET /api/auth/user
async fn get_user(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let account = app_state.user_use_cases.get_account(user.id).await?;
    Ok(ok(account))
}

#[derive(Deserialize)]
struct UpdateUserPayload {
    name: String,
}

/// PATCH /api/auth/user
async fn update_user(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<UpdateUserPayload>,
) -> AppResult<impl IntoResponse> {
    let profile = app_state
        .user_use_cases
        .update_name(user.id, &payload.name)
        .await?;
    Ok(ok(profile))
}
