use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{
        app_state::AppState, extract::AppQuery, middleware::CurrentUser, response::ok,
    },
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/revenue", get(get_revenue))
        .route("/trends", get(get_trends))
}

#[derive(Deserialize)]
struct RevenueQuery {
    model_id: Uuid,
    year: i32,
    month: u32,
    top: Option<usize>,
}

/// GET /api/analytics/revenue?model_id=&year=&month=&top=
async fn get_revenue(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppQuery(query): AppQuery<RevenueQuery>,
) -> AppResult<impl IntoResponse> {
    let report = app_state
        .analytics_use_cases
        .revenue(
            user.id,
            user.plan,
            query.model_id,
            query.year,
            query.month,
            query.top,
        )
        .await?;
    Ok(ok(report))
}

#[derive(Deserialize)]
struct TrendsQuery {
    model_id: Uuid,
    months: Option<u32>,
}

/// GET /api/analytics/trends?model_id=&months=
async fn get_trends(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppQuery(query): AppQuery<TrendsQuery>,
) -> AppResult<impl IntoResponse> {
    let report = app_state
        .analytics_use_cases
        .trends(user.id, user.plan, query.model_id, query.months)
        .await?;
    Ok(ok(report))
}
