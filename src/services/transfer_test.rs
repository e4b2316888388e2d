use time::macros::datetime;

use super::*;
use crate::models::FileType;
use crate::state::test_helpers::{seed_project, test_app_state};

fn folder(id: Id, parent_id: Option<Id>) -> Folder {
    Folder {
        id,
        project_id: 1,
        name: format!("f{id}"),
        parent_id,
        path: format!("/f{id}"),
        created_at: datetime!(2025-01-01 00:00 UTC),
        updated_at: datetime!(2025-01-01 00:00 UTC),
    }
}

#[test]
fn parents_first_orders_children_after_parents() {
    let ordered = parents_first(vec![folder(3, Some(2)), folder(2, Some(1)), folder(1, None), folder(4, None)]);
    let ids: Vec<_> = ordered.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![1, 4, 2, 3]);
}

#[test]
fn parents_first_keeps_orphans() {
    let ordered = parents_first(vec![folder(5, Some(99)), folder(1, None)]);
    let ids: Vec<_> = ordered.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![1, 5]);
}

#[test]
fn parse_import_skips_meta_line() {
    let line = r#"{"kind":"project_export_meta","version":1,"projectId":7}"#;
    assert!(parse_import_line(line).expect("parse").is_none());
}

#[test]
fn parse_import_skips_unknown_kind() {
    assert!(parse_import_line(r#"{"kind":"comment","content":"hi"}"#).expect("parse").is_none());
    assert!(parse_import_line("[1,2,3]").expect("parse").is_none());
}

#[test]
fn parse_import_rejects_malformed_json() {
    assert!(parse_import_line("{not json").is_err());
}

#[test]
fn parse_import_reads_file_line_with_type_field() {
    let line = r#"{"kind":"file","id":12,"folderId":4,"name":"robot.fbx","type":"model","path":"/robot.fbx","size":10}"#;
    match parse_import_line(line).expect("parse") {
        Some(ImportLine::File { old_id, draft }) => {
            assert_eq!(old_id, Some(12));
            assert_eq!(draft.folder_id, Some(4));
            assert_eq!(draft.file_type, Some(FileType::Model));
        }
        other => panic!("unexpected line: {other:?}"),
    }
}

#[tokio::test]
async fn export_then_import_remaps_references() {
    let state = test_app_state();
    let gateway = &state.gateway;
    let source = seed_project(&state, "Source").await;

    let milestone = gateway
        .create_milestone(source.id, MilestoneDraft { name: Some("Modeling".into()), ..MilestoneDraft::default() })
        .await
        .expect("milestone");
    gateway
        .create_task(
            source.id,
            TaskDraft {
                title: Some("Block out".into()),
                milestone_id: Some(milestone.id),
                ..TaskDraft::default()
            },
        )
        .await
        .expect("task");
    let root = gateway
        .create_folder(source.id, FolderDraft { name: Some("assets".into()), path: Some("/assets".into()), ..FolderDraft::default() })
        .await
        .expect("root");
    let child = gateway
        .create_folder(
            source.id,
            FolderDraft { name: Some("models".into()), parent_id: Some(root.id), path: Some("/assets/models".into()) },
        )
        .await
        .expect("child");
    gateway
        .create_file(
            source.id,
            FileDraft {
                folder_id: Some(child.id),
                name: Some("robot.fbx".into()),
                file_type: Some(FileType::Model),
                path: Some("/assets/models/robot.fbx".into()),
                size: Some(1024),
                ..FileDraft::default()
            },
        )
        .await
        .expect("file");

    let lines = export_lines(gateway, source.id).await.expect("export");
    assert_eq!(lines.len(), 6);
    assert!(lines[0].contains(META_KIND));
    assert!(lines.iter().all(|l| l.ends_with('\n')));

    let target = seed_project(&state, "Target").await;
    let summary = import_lines(gateway, target.id, &lines.concat()).await.expect("import");
    assert_eq!(summary, ImportSummary { imported: 5, skipped: 1 });

    let milestones = gateway.list_milestones(target.id).await.expect("milestones");
    let tasks = gateway.list_tasks(target.id, None).await.expect("tasks");
    assert_eq!(tasks[0].milestone_id, Some(milestones[0].id));

    let folders = gateway.list_folders(target.id, None).await.expect("folders");
    let new_root = folders.iter().find(|f| f.name == "assets").expect("assets");
    let new_child = folders.iter().find(|f| f.name == "models").expect("models");
    assert_eq!(new_child.parent_id, Some(new_root.id));
    assert_ne!(new_root.id, root.id);

    let files = gateway.list_files(target.id, Some(new_child.id)).await.expect("files");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "robot.fbx");
}

#[tokio::test]
async fn import_counts_invalid_lines_as_skipped() {
    let state = test_app_state();
    let target = seed_project(&state, "Target").await;
    let jsonl = [
        r#"{"kind":"milestone","id":1,"name":"Rigging"}"#,
        r#"{"kind":"milestone","id":2,"name":"   "}"#,
        "",
        "garbage",
        r#"{"kind":"task","title":"Orphan","milestoneId":42}"#,
    ]
    .join("\n");

    let summary = import_lines(&state.gateway, target.id, &jsonl).await.expect("import");
    assert_eq!(summary, ImportSummary { imported: 2, skipped: 2 });

    let tasks = state.gateway.list_tasks(target.id, None).await.expect("tasks");
    assert_eq!(tasks[0].milestone_id, None);
}

#[tokio::test]
async fn import_into_missing_project_is_not_found() {
    let state = test_app_state();
    let err = import_lines(&state.gateway, 404, "").await.expect_err("missing");
    assert!(matches!(err, GatewayError::NotFound { id: 404, .. }));
}

#[tokio::test]
async fn export_of_missing_project_is_not_found() {
    let state = test_app_state();
    let err = export_lines(&state.gateway, 404).await.expect_err("missing");
    assert!(matches!(err, TransferError::Gateway(GatewayError::NotFound { .. })));
}
