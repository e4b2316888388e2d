//! Chat session and dashboard routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::chat::{Message, UiState};
use crate::models::EntityKind;
use crate::services::chat::{self, SessionSnapshot, SubmitOutcome};
use crate::services::dashboard::{self, DashboardQuery, DashboardView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    pub text: String,
}

/// `POST /api/chat/sessions`: open a greeted session.
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionSnapshot>) {
    (StatusCode::CREATED, Json(chat::create_session(&state).await))
}

/// `GET /api/chat/sessions/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    Ok(Json(chat::get_session(&state, id).await?))
}

/// `DELETE /api/chat/sessions/{id}`
pub async fn end_session(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, ApiError> {
    chat::end_session(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/chat/sessions/{id}/messages`
pub async fn list_messages(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(chat::messages(&state, id).await?))
}

/// `POST /api/chat/sessions/{id}/messages`: responds once the reply is in.
pub async fn submit_message(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<SubmitBody>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    Ok(Json(chat::submit(&state, id, &body.text).await?))
}

/// `GET /api/chat/sessions/{id}/ui`
pub async fn ui_state(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<UiState>, ApiError> {
    Ok(Json(chat::ui_state(&state, id).await?))
}

/// `GET /api/chat/sessions/{id}/dashboard[?tab&projectId&fileId]`
pub async fn dashboard(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> Result<Json<DashboardView>, ApiError> {
    let ui = chat::ui_state(&state, id).await?;
    let view = dashboard::build_dashboard(&state.gateway, &ui, &query)
        .await
        .map_err(ApiError::on("render", EntityKind::Project))?;
    Ok(Json(view))
}
