use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use fanledger_analytics::TransactionRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{AppJson, AppPath, AppQuery},
        middleware::CurrentUser,
        response::ok,
    },
    app_error::AppResult,
    application::use_cases::monthly_data::{MonthlyDataSummary, UploadInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_monthly_data).post(upload_monthly_data))
        .route("/{id}", get(get_monthly_data).delete(delete_monthly_data))
}

#[derive(Deserialize)]
struct UploadPayload {
    model_id: Uuid,
    year: i32,
    month: u32,
    #[serde(default)]
    csv: Option<String>,
    #[serde(default)]
    transactions: Option<Vec<TransactionRecord>>,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    data: MonthlyDataSummary,
    skipped_rows: usize,
}

/// POST /api/monthly-data
async fn upload_monthly_data(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<UploadPayload>,
) -> AppResult<impl IntoResponse> {
    let outcome = app_state
        .monthly_data_use_cases
        .upload(
            user.id,
            user.plan,
            UploadInput {
                model_id: payload.model_id,
                year: payload.year,
                month: payload.month,
                csv: payload.csv,
                transactions: payload.transactions,
            },
        )
        .await?;

    Ok(Json(UploadResponse {
        success: true,
        data: outcome.data,
        skipped_rows: outcome.skipped_rows,
    }))
}

#[derive(Deserialize)]
struct ListQuery {
    model_id: Option<Uuid>,
    year: Option<i32>,
}

/// GET /api/monthly-data?model_id=&year=
async fn list_monthly_data(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<impl IntoResponse> {
    let rows = app_state
        .monthly_data_use_cases
        .list(user.id, query.model_id, query.year)
        .await?;
    Ok(ok(rows))
}

/// GET /api/monthly-data/{id}
async fn get_monthly_data(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let row = app_state.monthly_data_use_cases.get(user.id, id).await?;
    Ok(ok(row))
}

/// DELETE /api/monthly-data/{id}
async fn delete_monthly_data(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    app_state.monthly_data_use_cases.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
