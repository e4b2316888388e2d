//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the CRUD API over the gateway, the chat session
//! endpoints, the dashboard, and project JSONL transfer. All bodies are
//! camelCase JSON; failures use the `ApiError` body.

pub mod chat;
pub mod error;
pub mod files;
pub mod projects;
pub mod transfer;
pub mod users;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/projects", get(projects::list_projects).post(projects::create_project))
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/projects/{id}/members",
            get(projects::list_members).post(projects::add_member),
        )
        .route(
            "/api/projects/{id}/members/{user_id}",
            get(projects::get_member)
                .patch(projects::update_member)
                .delete(projects::remove_member),
        )
        .route(
            "/api/projects/{id}/milestones",
            get(projects::list_milestones).post(projects::create_milestone),
        )
        .route(
            "/api/milestones/{id}",
            get(projects::get_milestone)
                .patch(projects::update_milestone)
                .delete(projects::delete_milestone),
        )
        .route(
            "/api/projects/{id}/tasks",
            get(projects::list_tasks).post(projects::create_task),
        )
        .route(
            "/api/tasks/{id}",
            get(projects::get_task)
                .patch(projects::update_task)
                .delete(projects::delete_task),
        )
        .route("/api/tasks/{id}/comments", get(files::list_task_comments))
        .route(
            "/api/projects/{id}/folders",
            get(files::list_folders).post(files::create_folder),
        )
        .route(
            "/api/folders/{id}",
            get(files::get_folder)
                .patch(files::update_folder)
                .delete(files::delete_folder),
        )
        .route("/api/projects/{id}/files", get(files::list_files).post(files::create_file))
        .route(
            "/api/files/{id}",
            get(files::get_file)
                .patch(files::update_file)
                .delete(files::delete_file),
        )
        .route(
            "/api/files/{id}/versions",
            get(files::list_file_versions).post(files::record_file_version),
        )
        .route(
            "/api/file-versions/{id}",
            get(files::get_file_version)
                .patch(files::update_file_version)
                .delete(files::delete_file_version),
        )
        .route(
            "/api/files/{id}/activities",
            get(files::list_file_activities).post(files::create_file_activity),
        )
        .route(
            "/api/file-activities/{id}",
            get(files::get_file_activity)
                .patch(files::update_file_activity)
                .delete(files::delete_file_activity),
        )
        .route("/api/files/{id}/comments", get(files::list_file_comments))
        .route("/api/comments", post(files::create_comment))
        .route(
            "/api/comments/{id}",
            get(files::get_comment)
                .patch(files::update_comment)
                .delete(files::delete_comment),
        )
        .route("/api/projects/{id}/export.jsonl", get(transfer::export_jsonl))
        .route("/api/projects/{id}/import.jsonl", post(transfer::import_jsonl))
        .route("/api/chat/sessions", post(chat::create_session))
        .route(
            "/api/chat/sessions/{id}",
            get(chat::get_session).delete(chat::end_session),
        )
        .route(
            "/api/chat/sessions/{id}/messages",
            get(chat::list_messages).post(chat::submit_message),
        )
        .route("/api/chat/sessions/{id}/ui", get(chat::ui_state))
        .route("/api/chat/sessions/{id}/dashboard", get(chat::dashboard))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
