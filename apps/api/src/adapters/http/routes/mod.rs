pub mod admin;
pub mod analytics;
pub mod auth;
pub mod models;
pub mod monitoring;
pub mod monthly_data;
pub mod stripe;
pub mod usage_stats;

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::adapters::http::{app_state::AppState, middleware::auth_middleware};

/// All `/api` routes. Everything except the Stripe webhook and health check
/// sits behind bearer-token authentication.
pub fn router(app_state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/auth", auth::router())
        .nest("/models", models::router())
        .nest("/monthly-data", monthly_data::router())
        .nest("/analytics", analytics::router())
        .nest("/usage-stats", usage_stats::router())
        .nest("/monitoring", monitoring::router())
        .nest("/admin", admin::router())
        .nest("/stripe", stripe::router())
        .route_layer(middleware::from_fn_with_state(app_state, auth_middleware));

    Router::new()
        .merge(protected)
        .route("/stripe/webhook", post(stripe::handle_webhook))
        .route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
