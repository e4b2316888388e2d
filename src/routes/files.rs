//! Folder, file, version, activity and comment routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::models::input::{
    CommentDraft, CommentPatch, FileActivityDraft, FileActivityPatch, FileDraft, FilePatch, FileVersionDraft,
    FileVersionPatch, FolderDraft, FolderPatch,
};
use crate::models::{Comment, EntityKind, File, FileActivity, FileVersion, Folder, Id};
use crate::state::AppState;

// =============================================================================
// FOLDERS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFilter {
    pub parent_id: Option<Id>,
}

/// `GET /api/projects/{id}/folders[?parentId]`: project-wide, or the direct
/// children of `parentId`.
pub async fn list_folders(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
    ApiQuery(filter): ApiQuery<FolderFilter>,
) -> Result<Json<Vec<Folder>>, ApiError> {
    let folders = state
        .gateway
        .list_folders(project_id, filter.parent_id)
        .await
        .map_err(ApiError::on("list", EntityKind::Folder))?;
    Ok(Json(folders))
}

pub async fn get_folder(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<Json<Folder>, ApiError> {
    let folder = state.gateway.get_folder(id).await.map_err(ApiError::on("read", EntityKind::Folder))?;
    Ok(Json(folder))
}

pub async fn create_folder(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
    ApiJson(draft): ApiJson<FolderDraft>,
) -> Result<(StatusCode, Json<Folder>), ApiError> {
    let folder = state
        .gateway
        .create_folder(project_id, draft)
        .await
        .map_err(ApiError::on("create", EntityKind::Folder))?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn update_folder(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(patch): ApiJson<FolderPatch>,
) -> Result<Json<Folder>, ApiError> {
    let folder = state
        .gateway
        .update_folder(id, patch)
        .await
        .map_err(ApiError::on("update", EntityKind::Folder))?;
    Ok(Json(folder))
}

/// `DELETE /api/folders/{id}`: removes subfolders and their files too.
pub async fn delete_folder(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<StatusCode, ApiError> {
    state.gateway.delete_folder(id).await.map_err(ApiError::on("delete", EntityKind::Folder))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// FILES
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFilter {
    pub folder_id: Option<Id>,
}

/// `GET /api/projects/{id}/files[?folderId]`
pub async fn list_files(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
    ApiQuery(filter): ApiQuery<FileFilter>,
) -> Result<Json<Vec<File>>, ApiError> {
    let files = state
        .gateway
        .list_files(project_id, filter.folder_id)
        .await
        .map_err(ApiError::on("list", EntityKind::File))?;
    Ok(Json(files))
}

pub async fn get_file(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<Json<File>, ApiError> {
    let file = state.gateway.get_file(id).await.map_err(ApiError::on("read", EntityKind::File))?;
    Ok(Json(file))
}

pub async fn create_file(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
    ApiJson(draft): ApiJson<FileDraft>,
) -> Result<(StatusCode, Json<File>), ApiError> {
    let file = state
        .gateway
        .create_file(project_id, draft)
        .await
        .map_err(ApiError::on("create", EntityKind::File))?;
    Ok((StatusCode::CREATED, Json(file)))
}

pub async fn update_file(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(patch): ApiJson<FilePatch>,
) -> Result<Json<File>, ApiError> {
    let file = state.gateway.update_file(id, patch).await.map_err(ApiError::on("update", EntityKind::File))?;
    Ok(Json(file))
}

pub async fn delete_file(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<StatusCode, ApiError> {
    state.gateway.delete_file(id).await.map_err(ApiError::on("delete", EntityKind::File))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// VERSIONS
// =============================================================================

pub async fn list_file_versions(
    State(state): State<AppState>,
    ApiPath(file_id): ApiPath<Id>,
) -> Result<Json<Vec<FileVersion>>, ApiError> {
    let versions = state
        .gateway
        .list_file_versions(file_id)
        .await
        .map_err(ApiError::on("list", EntityKind::FileVersion))?;
    Ok(Json(versions))
}

pub async fn get_file_version(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<FileVersion>, ApiError> {
    let version = state
        .gateway
        .get_file_version(id)
        .await
        .map_err(ApiError::on("read", EntityKind::FileVersion))?;
    Ok(Json(version))
}

/// `POST /api/files/{id}/versions`: records the version, repoints the file
/// and logs a `version` activity in one step.
pub async fn record_file_version(
    State(state): State<AppState>,
    ApiPath(file_id): ApiPath<Id>,
    ApiJson(draft): ApiJson<FileVersionDraft>,
) -> Result<(StatusCode, Json<FileVersion>), ApiError> {
    let version = state
        .gateway
        .record_file_version(file_id, draft)
        .await
        .map_err(ApiError::on("create", EntityKind::FileVersion))?;
    Ok((StatusCode::CREATED, Json(version)))
}

pub async fn update_file_version(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(patch): ApiJson<FileVersionPatch>,
) -> Result<Json<FileVersion>, ApiError> {
    let version = state
        .gateway
        .update_file_version(id, patch)
        .await
        .map_err(ApiError::on("update", EntityKind::FileVersion))?;
    Ok(Json(version))
}

pub async fn delete_file_version(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<StatusCode, ApiError> {
    state
        .gateway
        .delete_file_version(id)
        .await
        .map_err(ApiError::on("delete", EntityKind::FileVersion))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// ACTIVITIES
// =============================================================================

pub async fn list_file_activities(
    State(state): State<AppState>,
    ApiPath(file_id): ApiPath<Id>,
) -> Result<Json<Vec<FileActivity>>, ApiError> {
    let activities = state
        .gateway
        .list_file_activities(file_id)
        .await
        .map_err(ApiError::on("list", EntityKind::FileActivity))?;
    Ok(Json(activities))
}

pub async fn get_file_activity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<Json<FileActivity>, ApiError> {
    let activity = state
        .gateway
        .get_file_activity(id)
        .await
        .map_err(ApiError::on("read", EntityKind::FileActivity))?;
    Ok(Json(activity))
}

pub async fn create_file_activity(
    State(state): State<AppState>,
    ApiPath(file_id): ApiPath<Id>,
    ApiJson(draft): ApiJson<FileActivityDraft>,
) -> Result<(StatusCode, Json<FileActivity>), ApiError> {
    let activity = state
        .gateway
        .create_file_activity(file_id, draft)
        .await
        .map_err(ApiError::on("create", EntityKind::FileActivity))?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn update_file_activity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(patch): ApiJson<FileActivityPatch>,
) -> Result<Json<FileActivity>, ApiError> {
    let activity = state
        .gateway
        .update_file_activity(id, patch)
        .await
        .map_err(ApiError::on("update", EntityKind::FileActivity))?;
    Ok(Json(activity))
}

pub async fn delete_file_activity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
) -> Result<StatusCode, ApiError> {
    state
        .gateway
        .delete_file_activity(id)
        .await
        .map_err(ApiError::on("delete", EntityKind::FileActivity))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// COMMENTS
// =============================================================================

pub async fn list_task_comments(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<Id>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = state
        .gateway
        .list_task_comments(task_id)
        .await
        .map_err(ApiError::on("list", EntityKind::Comment))?;
    Ok(Json(comments))
}

pub async fn list_file_comments(
    State(state): State<AppState>,
    ApiPath(file_id): ApiPath<Id>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = state
        .gateway
        .list_file_comments(file_id)
        .await
        .map_err(ApiError::on("list", EntityKind::Comment))?;
    Ok(Json(comments))
}

pub async fn get_comment(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<Json<Comment>, ApiError> {
    let comment = state.gateway.get_comment(id).await.map_err(ApiError::on("read", EntityKind::Comment))?;
    Ok(Json(comment))
}

/// `POST /api/comments`: targets a task or a file via `taskId`/`fileId`.
pub async fn create_comment(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<CommentDraft>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .gateway
        .create_comment(draft)
        .await
        .map_err(ApiError::on("create", EntityKind::Comment))?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Id>,
    ApiJson(patch): ApiJson<CommentPatch>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state
        .gateway
        .update_comment(id, patch)
        .await
        .map_err(ApiError::on("update", EntityKind::Comment))?;
    Ok(Json(comment))
}

pub async fn delete_comment(State(state): State<AppState>, ApiPath(id): ApiPath<Id>) -> Result<StatusCode, ApiError> {
    state.gateway.delete_comment(id).await.map_err(ApiError::on("delete", EntityKind::Comment))?;
    Ok(StatusCode::NO_CONTENT)
}
