use time::macros::datetime;

use super::*;

// =============================================================================
// VALIDATOR
// =============================================================================

#[test]
fn text_trims_and_rejects_blank() {
    let mut v = Validator::default();
    assert_eq!(v.text("name", Some("  Robot ".into())), Some("Robot".into()));
    assert_eq!(v.text("name", Some("   ".into())), None);
    assert_eq!(v.text("path", None), None);

    let err = v.into_error();
    assert_eq!(
        err.errors,
        vec![
            FieldError { field: "name".into(), message: "must not be blank".into() },
            FieldError { field: "path".into(), message: "is required".into() },
        ]
    );
}

#[test]
fn extension_requires_stem_and_suffix() {
    assert_eq!(extension_of("robot.fbx"), Some("fbx"));
    assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
    assert_eq!(extension_of(".blend"), None);
    assert_eq!(extension_of("README"), None);
    assert_eq!(extension_of("trailing."), None);
}

// =============================================================================
// DRAFTS
// =============================================================================

#[test]
fn user_draft_collects_every_error() {
    let err = UserDraft { username: Some(" ".into()), email: Some("nope".into()), ..UserDraft::default() }
        .validate()
        .expect_err("invalid");
    assert!(err.has_field("username"));
    assert!(err.has_field("fullName"));
    assert!(err.has_field("email"));
}

#[test]
fn user_draft_defaults_role() {
    let user = UserDraft {
        username: Some("jdoe".into()),
        full_name: Some("John Doe".into()),
        email: Some("jdoe@example.com".into()),
        ..UserDraft::default()
    }
    .validate()
    .expect("valid");
    assert_eq!(user.role, "member");
}

#[test]
fn project_end_before_start_is_rejected() {
    let err = ProjectDraft {
        name: Some("Robot".into()),
        start_date: Some(datetime!(2025-06-01 00:00 UTC)),
        end_date: Some(datetime!(2025-05-01 00:00 UTC)),
        ..ProjectDraft::default()
    }
    .validate()
    .expect_err("invalid");
    assert!(err.has_field("endDate"));
    assert_eq!(err.to_string(), "validation failed: endDate must not be before startDate");
}

#[test]
fn project_draft_parses_rfc3339_and_defaults_status() {
    let draft: ProjectDraft =
        serde_json::from_str(r#"{"name":"Robot","startDate":"2025-04-02T00:00:00Z"}"#).expect("json");
    let project = draft.validate().expect("valid");
    assert_eq!(project.start_date, datetime!(2025-04-02 00:00 UTC));
    assert_eq!(project.status, "active");
    assert_eq!(project.end_date, None);
}

#[test]
fn file_extension_defaults_from_name() {
    let file = FileDraft {
        name: Some("robot.FBX".into()),
        file_type: Some(FileType::Model),
        path: Some("/robot.FBX".into()),
        size: Some(0),
        ..FileDraft::default()
    }
    .validate(1)
    .expect("valid");
    assert_eq!(file.file_extension, "FBX");
}

#[test]
fn file_without_extension_or_size_is_rejected() {
    let err = FileDraft {
        name: Some("README".into()),
        file_type: Some(FileType::Document),
        path: Some("/README".into()),
        size: Some(-1),
        ..FileDraft::default()
    }
    .validate(1)
    .expect_err("invalid");
    assert!(err.has_field("fileExtension"));
    assert!(err.has_field("size"));
}

#[test]
fn version_number_must_be_positive() {
    let err = FileVersionDraft { version_number: Some(0), ..FileVersionDraft::default() }
        .validate(1)
        .expect_err("invalid");
    assert!(err.has_field("versionNumber"));

    let ok = FileVersionDraft::default().validate(1).expect("valid");
    assert_eq!(ok.version_number, None);
}

#[test]
fn comment_needs_a_target() {
    let err = CommentDraft { user_id: Some(1), content: Some("nice".into()), ..CommentDraft::default() }
        .validate()
        .expect_err("invalid");
    assert!(err.has_field("taskId"));
}

#[test]
fn task_draft_rejects_negative_estimate() {
    let err = TaskDraft { title: Some("Rig".into()), estimated_hours: Some(-3), ..TaskDraft::default() }
        .validate(1)
        .expect_err("invalid");
    assert!(err.has_field("estimatedHours"));
}

// =============================================================================
// PATCHES
// =============================================================================

#[test]
fn patch_distinguishes_null_from_absent() {
    let cleared: TaskPatch = serde_json::from_str(r#"{"milestoneId":null}"#).expect("json");
    assert_eq!(cleared.milestone_id, Some(None));
    let untouched: TaskPatch = serde_json::from_str("{}").expect("json");
    assert_eq!(untouched.milestone_id, None);
}

#[test]
fn project_patch_clears_end_date() {
    let mut project = Project {
        id: 1,
        name: "Robot".into(),
        description: Some("old".into()),
        start_date: datetime!(2025-04-02 00:00 UTC),
        end_date: Some(datetime!(2025-06-30 00:00 UTC)),
        status: "active".into(),
        created_at: datetime!(2025-04-01 00:00 UTC),
        updated_at: datetime!(2025-04-01 00:00 UTC),
    };
    let patch: ProjectPatch = serde_json::from_str(r#"{"endDate":null,"name":" Robot v2 "}"#).expect("json");
    patch.validate().expect("valid").apply(&mut project);

    assert_eq!(project.end_date, None);
    assert_eq!(project.name, "Robot v2");
    assert_eq!(project.description.as_deref(), Some("old"));
}

#[test]
fn blank_patch_text_is_rejected() {
    let err = FolderPatch { name: Some(" ".into()), ..FolderPatch::default() }.validate().expect_err("invalid");
    assert!(err.has_field("name"));
}
