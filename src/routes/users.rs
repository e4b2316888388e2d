//! User routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;

use super::error::{ApiError, ApiJson, ApiPath};
use crate::models::input::{UserDraft, UserPatch};
use crate::models::{EntityKind, Id, User};
use crate::state::AppState;

/// `GET /api/users`
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.gateway.list_users().await.map_err(ApiError::on("list", EntityKind::User))?;
    Ok(Json(users))
}

/// `GET /api/users/{id}`
pub async fn get_user(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<Json<User>, ApiError> {
    let user = state.gateway.get_user(id).await.map_err(ApiError::on("read", EntityKind::User))?;
    Ok(Json(user))
}

/// `POST /api/users`
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<UserDraft>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.gateway.create_user(draft).await.map_err(ApiError::on("create", EntityKind::User))?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PATCH /api/users/{id}`
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<User>, ApiError> {
    let user = state.gateway.update_user(id, patch).await.map_err(ApiError::on("update", EntityKind::User))?;
    Ok(Json(user))
}

/// `DELETE /api/users/{id}`: also drops memberships and comments.
pub async fn delete_user(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<StatusCode, ApiError> {
    state.gateway.delete_user(id).await.map_err(ApiError::on("delete", EntityKind::User))?;
    Ok(StatusCode::NO_CONTENT)
}
