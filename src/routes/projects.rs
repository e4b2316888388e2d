//! Project, member, milestone and task routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::models::input::{
    MemberDraft, MemberPatch, MilestoneDraft, MilestonePatch, ProjectDraft, ProjectPatch, TaskDraft, TaskPatch,
};
use crate::models::{EntityKind, Id, MemberWithUser, Milestone, Project, ProjectMember, Task};
use crate::state::AppState;

// =============================================================================
// PROJECTS
// =============================================================================

/// `GET /api/projects`: newest first.
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state.gateway.list_projects().await.map_err(ApiError::on("list", EntityKind::Project))?;
    Ok(Json(projects))
}

/// `GET /api/projects/{id}`
pub async fn get_project(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<Json<Project>, ApiError> {
    let project = state.gateway.get_project(id).await.map_err(ApiError::on("read", EntityKind::Project))?;
    Ok(Json(project))
}

/// `POST /api/projects`
pub async fn create_project(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<ProjectDraft>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state
        .gateway
        .create_project(draft)
        .await
        .map_err(ApiError::on("create", EntityKind::Project))?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// `PATCH /api/projects/{id}`
pub async fn update_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(patch): ApiJson<ProjectPatch>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .gateway
        .update_project(id, patch)
        .await
        .map_err(ApiError::on("update", EntityKind::Project))?;
    Ok(Json(project))
}

/// `DELETE /api/projects/{id}`: cascades to everything the project owns.
pub async fn delete_project(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<StatusCode, ApiError> {
    state.gateway.delete_project(id).await.map_err(ApiError::on("delete", EntityKind::Project))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// MEMBERS
// =============================================================================

/// `GET /api/projects/{id}/members`: memberships joined with users.
pub async fn list_members(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
) -> Result<Json<Vec<MemberWithUser>>, ApiError> {
    let members = state
        .gateway
        .list_members(project_id)
        .await
        .map_err(ApiError::on("list", EntityKind::Member))?;
    Ok(Json(members))
}

/// `GET /api/projects/{id}/members/{user_id}`
pub async fn get_member(
    State(state): State<AppState>,
    ApiPath((project_id, user_id)): ApiPath<(Id, Id)>,
) -> Result<Json<ProjectMember>, ApiError> {
    let member = state
        .gateway
        .get_member(project_id, user_id)
        .await
        .map_err(ApiError::on("read", EntityKind::Member))?;
    Ok(Json(member))
}

/// `POST /api/projects/{id}/members`
pub async fn add_member(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
    ApiJson(draft): ApiJson<MemberDraft>,
) -> Result<(StatusCode, Json<ProjectMember>), ApiError> {
    let member = state
        .gateway
        .add_member(project_id, draft)
        .await
        .map_err(ApiError::on("add", EntityKind::Member))?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// `PATCH /api/projects/{id}/members/{user_id}`
pub async fn update_member(
    State(state): State<AppState>,
    ApiPath((project_id, user_id)): ApiPath<(Id, Id)>,
    ApiJson(patch): ApiJson<MemberPatch>,
) -> Result<Json<ProjectMember>, ApiError> {
    let member = state
        .gateway
        .update_member(project_id, user_id, patch)
        .await
        .map_err(ApiError::on("update", EntityKind::Member))?;
    Ok(Json(member))
}

/// `DELETE /api/projects/{id}/members/{user_id}`
pub async fn remove_member(
    State(state): State<AppState>,
    ApiPath((project_id, user_id)): ApiPath<(Id, Id)>,
) -> Result<StatusCode, ApiError> {
    state
        .gateway
        .remove_member(project_id, user_id)
        .await
        .map_err(ApiError::on("remove", EntityKind::Member))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// MILESTONES
// =============================================================================

pub async fn list_milestones(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
) -> Result<Json<Vec<Milestone>>, ApiError> {
    let milestones = state
        .gateway
        .list_milestones(project_id)
        .await
        .map_err(ApiError::on("list", EntityKind::Milestone))?;
    Ok(Json(milestones))
}

pub async fn get_milestone(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<Milestone>, ApiError> {
    let milestone = state.gateway.get_milestone(id).await.map_err(ApiError::on("read", EntityKind::Milestone))?;
    Ok(Json(milestone))
}

pub async fn create_milestone(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
    ApiJson(draft): ApiJson<MilestoneDraft>,
) -> Result<(StatusCode, Json<Milestone>), ApiError> {
    let milestone = state
        .gateway
        .create_milestone(project_id, draft)
        .await
        .map_err(ApiError::on("create", EntityKind::Milestone))?;
    Ok((StatusCode::CREATED, Json(milestone)))
}

pub async fn update_milestone(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(patch): ApiJson<MilestonePatch>,
) -> Result<Json<Milestone>, ApiError> {
    let milestone = state
        .gateway
        .update_milestone(id, patch)
        .await
        .map_err(ApiError::on("update", EntityKind::Milestone))?;
    Ok(Json(milestone))
}

/// `DELETE /api/milestones/{id}`: dependent tasks keep existing with no milestone.
pub async fn delete_milestone(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<StatusCode, ApiError> {
    state
        .gateway
        .delete_milestone(id)
        .await
        .map_err(ApiError::on("delete", EntityKind::Milestone))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// TASKS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub milestone_id: Option<Id>,
}

/// `GET /api/projects/{id}/tasks[?milestoneId]`
pub async fn list_tasks(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
    ApiQuery(filter): ApiQuery<TaskFilter>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .gateway
        .list_tasks(project_id, filter.milestone_id)
        .await
        .map_err(ApiError::on("list", EntityKind::Task))?;
    Ok(Json(tasks))
}

pub async fn get_task(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<Json<Task>, ApiError> {
    let task = state.gateway.get_task(id).await.map_err(ApiError::on("read", EntityKind::Task))?;
    Ok(Json(task))
}

pub async fn create_task(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
    ApiJson(draft): ApiJson<TaskDraft>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state
        .gateway
        .create_task(project_id, draft)
        .await
        .map_err(ApiError::on("create", EntityKind::Task))?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let task = state.gateway.update_task(id, patch).await.map_err(ApiError::on("update", EntityKind::Task))?;
    Ok(Json(task))
}

pub async fn delete_task(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<StatusCode, ApiError> {
    state.gateway.delete_task(id).await.map_err(ApiError::on("delete", EntityKind::Task))?;
    Ok(StatusCode::NO_CONTENT)
}
