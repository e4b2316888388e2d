use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::*;
use crate::state::test_helpers::test_app_state;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, json)
}

async fn raw(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn new_project() -> Value {
    json!({"name": "Sci-Fi Robot", "startDate": "2025-04-02T00:00:00Z", "endDate": "2025-06-30T00:00:00Z"})
}

#[tokio::test]
async fn healthz_is_ok() {
    let app = app(test_app_state());
    let (status, _) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// CRUD
// =============================================================================

#[tokio::test]
async fn project_lifecycle_uses_rest_status_codes() {
    let app = app(test_app_state());

    let (status, created) = send(&app, "POST", "/api/projects", Some(new_project())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Sci-Fi Robot");
    let id = created["id"].as_i64().expect("id");

    let (status, listed) = send(&app, "GET", "/api/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, updated) = send(&app, "PATCH", &format!("/api/projects/{id}"), Some(json!({"status": "done"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "done");

    let (status, _) = send(&app, "DELETE", &format!("/api/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/api/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"code": "E_NOT_FOUND", "message": "Project not found"}));
}

#[tokio::test]
async fn invalid_create_lists_field_errors() {
    let app = app(test_app_state());
    let (status, body) = send(&app, "POST", "/api/projects", Some(json!({"description": "no name"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E_VALIDATION");
    assert_eq!(body["message"], "Validation failed");
    let fields: Vec<_> = body["errors"]
        .as_array()
        .expect("errors")
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"startDate"));
}

#[tokio::test]
async fn malformed_json_is_a_body_validation_error() {
    let app = app(test_app_state());
    let (status, body) = raw(&app, "POST", "/api/projects", "{\"name\": ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E_VALIDATION");
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn bad_path_and_query_are_validation_errors() {
    let app = app(test_app_state());

    let (status, body) = send(&app, "GET", "/api/projects/robot", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E_VALIDATION");
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "path");

    let (status, body) = send(&app, "GET", "/api/chat/sessions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "path");

    let (_, session) = send(&app, "POST", "/api/chat/sessions", None).await;
    let sid = session["id"].as_str().expect("session id");
    let (status, body) = send(&app, "GET", &format!("/api/chat/sessions/{sid}/dashboard?tab=kitchen"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E_VALIDATION");
    assert_eq!(body["errors"][0]["field"], "query");

    let (status, body) = send(&app, "GET", "/api/projects/1/tasks?milestoneId=first", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "query");
}

#[tokio::test]
async fn folder_filter_and_cascade_over_http() {
    let app = app(test_app_state());
    let (_, project) = send(&app, "POST", "/api/projects", Some(new_project())).await;
    let pid = project["id"].as_i64().expect("id");

    let (status, root) = send(
        &app,
        "POST",
        &format!("/api/projects/{pid}/folders"),
        Some(json!({"name": "assets", "path": "/assets"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let root_id = root["id"].as_i64().expect("root");
    let (_, child) = send(
        &app,
        "POST",
        &format!("/api/projects/{pid}/folders"),
        Some(json!({"name": "models", "parentId": root_id, "path": "/assets/models"})),
    )
    .await;
    let child_id = child["id"].as_i64().expect("child");
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/projects/{pid}/files"),
        Some(json!({"folderId": child_id, "name": "robot.fbx", "type": "model", "path": "/assets/models/robot.fbx", "size": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, children) = send(&app, "GET", &format!("/api/projects/{pid}/folders?parentId={root_id}"), None).await;
    assert_eq!(children.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, "DELETE", &format!("/api/folders/{root_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, folders) = send(&app, "GET", &format!("/api/projects/{pid}/folders"), None).await;
    let (_, files) = send(&app, "GET", &format!("/api/projects/{pid}/files"), None).await;
    assert_eq!(folders, json!([]));
    assert_eq!(files, json!([]));
}

#[tokio::test]
async fn recording_a_version_repoints_the_file() {
    let app = app(test_app_state());
    let (_, project) = send(&app, "POST", "/api/projects", Some(new_project())).await;
    let pid = project["id"].as_i64().expect("id");
    let (_, file) = send(
        &app,
        "POST",
        &format!("/api/projects/{pid}/files"),
        Some(json!({"name": "robot.fbx", "type": "model", "path": "/robot.fbx", "size": 10})),
    )
    .await;
    let fid = file["id"].as_i64().expect("file");

    let (status, version) = send(
        &app,
        "POST",
        &format!("/api/files/{fid}/versions"),
        Some(json!({"size": 20, "changeDescription": "retopo"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(version["versionNumber"], 1);

    let (_, file) = send(&app, "GET", &format!("/api/files/{fid}"), None).await;
    assert_eq!(file["currentVersionId"], version["id"]);
    assert_eq!(file["size"], 20);

    let (_, activities) = send(&app, "GET", &format!("/api/files/{fid}/activities"), None).await;
    assert_eq!(activities[0]["action"], "version");
}

// =============================================================================
// CHAT
// =============================================================================

#[tokio::test]
async fn chat_flow_unlocks_and_renders_dashboard() {
    let app = app(test_app_state());

    let (status, session) = send(&app, "POST", "/api/chat/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = session["id"].as_str().expect("id").to_owned();
    assert_eq!(session["messages"][0]["sender"], "assistant");
    assert_eq!(session["uiState"]["projectSetup"], false);

    let (_, view) = send(&app, "GET", &format!("/api/chat/sessions/{id}/dashboard"), None).await;
    assert_eq!(view["placeholder"]["message"], "Project details will appear here as you chat");

    let (status, outcome) = send(
        &app,
        "POST",
        &format!("/api/chat/sessions/{id}/messages"),
        Some(json!({"text": "team members please"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["accepted"], true);
    assert_eq!(outcome["uiState"]["teamSetup"], true);
    assert_eq!(outcome["uiState"]["projectSetup"], true);

    let (_, ui) = send(&app, "GET", &format!("/api/chat/sessions/{id}/ui"), None).await;
    assert_eq!(ui["teamSetup"], true);

    let (_, view) = send(&app, "GET", &format!("/api/chat/sessions/{id}/dashboard?tab=team"), None).await;
    assert_eq!(view["title"], "Team Management");
    assert_eq!(view["panels"][0]["panel"], "teamSetup");

    let (_, messages) = send(&app, "GET", &format!("/api/chat/sessions/{id}/messages"), None).await;
    assert_eq!(messages.as_array().map(Vec::len), Some(3));

    let (status, _) = send(&app, "DELETE", &format!("/api/chat/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "GET", &format!("/api/chat/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E_NOT_FOUND");
}

#[tokio::test]
async fn blank_chat_input_is_not_accepted() {
    let app = app(test_app_state());
    let (_, session) = send(&app, "POST", "/api/chat/sessions", None).await;
    let id = session["id"].as_str().expect("id").to_owned();

    let (status, outcome) =
        send(&app, "POST", &format!("/api/chat/sessions/{id}/messages"), Some(json!({"text": "  "}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["accepted"], false);
    assert!(outcome.get("reply").is_none());
}

// =============================================================================
// TRANSFER
// =============================================================================

#[tokio::test]
async fn export_streams_ndjson_and_import_reports_counts() {
    let app = app(test_app_state());
    let (_, project) = send(&app, "POST", "/api/projects", Some(new_project())).await;
    let pid = project["id"].as_i64().expect("id");
    send(&app, "POST", &format!("/api/projects/{pid}/milestones"), Some(json!({"name": "Modeling"}))).await;

    let request = Request::builder()
        .uri(format!("/api/projects/{pid}/export.jsonl"))
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/x-ndjson; charset=utf-8")
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let jsonl = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert_eq!(jsonl.lines().count(), 2);

    let (_, target) = send(&app, "POST", "/api/projects", Some(new_project())).await;
    let tid = target["id"].as_i64().expect("id");
    let (status, summary) =
        send(&app, "POST", &format!("/api/projects/{tid}/import.jsonl"), Some(json!({"jsonl": jsonl}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary, json!({"imported": 1, "skipped": 1}));
}
