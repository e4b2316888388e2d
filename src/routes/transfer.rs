//! Project JSONL export/import routes.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use super::error::{ApiError, ApiJson, ApiPath};
use crate::models::{EntityKind, Id};
use crate::services::transfer::{self, ImportSummary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportJsonlBody {
    pub jsonl: String,
}

/// `GET /api/projects/{id}/export.jsonl`: download the project as NDJSON.
pub async fn export_jsonl(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
) -> Result<Response, ApiError> {
    let lines = transfer::export_lines(&state.gateway, project_id)
        .await
        .map_err(ApiError::transfer("export"))?;

    let stream = futures::stream::iter(
        lines
            .into_iter()
            .map(|line| Ok::<Bytes, std::convert::Infallible>(Bytes::from(line))),
    );
    let body = Body::from_stream(stream);
    let filename = format!("project-{project_id}.jsonl");

    Ok((
        [
            (CONTENT_TYPE, "application/x-ndjson; charset=utf-8"),
            (CONTENT_DISPOSITION, &format!("attachment; filename=\"{filename}\"")),
        ],
        body,
    )
        .into_response())
}

/// `POST /api/projects/{id}/import.jsonl`: replay exported lines.
pub async fn import_jsonl(
    State(state): State<AppState>,
    ApiPath(project_id): ApiPath<Id>,
    ApiJson(body): ApiJson<ImportJsonlBody>,
) -> Result<Json<ImportSummary>, ApiError> {
    let summary = transfer::import_lines(&state.gateway, project_id, &body.jsonl)
        .await
        .map_err(ApiError::on("import", EntityKind::Project))?;
    Ok(Json(summary))
}
