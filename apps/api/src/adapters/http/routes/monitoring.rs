use axum::{Router, extract::State, response::IntoResponse, routing::get};

use crate::adapters::http::{app_state::AppState, middleware::CurrentUser, response::ok};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_alerts))
}

/// GET /api/monitoring
async fn get_alerts(State(app_state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    let alerts = app_state
        .monitoring_use_cases
        .alerts(user.id, user.plan)
        .await;
    ok(alerts)
}
