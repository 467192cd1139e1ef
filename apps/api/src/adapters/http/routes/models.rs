use axum::{
    Router,
    extract::State,
    http::StatusCode,
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
    domain::entities::model::ModelStatus,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_models).post(create_model))
        .route("/{model_id}", patch(update_model).delete(delete_model))
}

/// GET /api/models
async fn list_models(
    State(app_state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let models = app_state.model_use_cases.list_models(user.id).await?;
    Ok(ok(models))
}

#[derive(Deserialize)]
struct CreateModelPayload {
    name: String,
}

/// POST /api/models
async fn create_model(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<CreateModelPayload>,
) -> AppResult<impl IntoResponse> {
    let model = app_state
        .model_use_cases
        .create_model(user.id, user.plan, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, ok(model)))
}

#[derive(Deserialize)]
struct UpdateModelPayload {
    name: Option<String>,
    status: Option<ModelStatus>,
}

/// PATCH /api/models/{model_id}
async fn update_model(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppPath(model_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateModelPayload>,
) -> AppResult<impl IntoResponse> {
    let model = app_state
        .model_use_cases
        .update_model(user.id, model_id, payload.name.as_deref(), payload.status)
        .await?;
    Ok(ok(model))
}

/// DELETE /api/models/{model_id}
async fn delete_model(
    State(app_state): State<AppState>,
    user: CurrentUser,
    AppPath(model_id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    app_state
        .model_use_cases
        .delete_model(user.id, model_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
