use axum::{Router, extract::State, response::IntoResponse, routing::get};

use crate::{
    adapters::http::{app_state::AppState, middleware::CurrentUser, response::ok},
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_usage_stats))
}

/// GET /api/usage-stats
async fn get_usage_stats(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let stats = app_state
        .usage_use_cases
        .usage_stats(user.id, user.plan)
        .await?;
    Ok(ok(stats))
}
