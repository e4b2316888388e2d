use time::macros::datetime;

use super::*;

fn user() -> User {
    User {
        id: 4,
        username: "jdoe".into(),
        full_name: "John Doe".into(),
        email: "jdoe@example.com".into(),
        avatar: None,
        role: "3D Modeler".into(),
    }
}

#[test]
fn task_status_uses_snake_case_on_the_wire() {
    assert_eq!(serde_json::to_value(TaskStatus::InProgress).expect("json"), "in_progress");
    assert_eq!(TaskStatus::default(), TaskStatus::Todo);
    for status in TaskStatus::ALL {
        assert_eq!(serde_json::to_value(status).expect("json"), status.as_str());
    }
}

#[test]
fn file_serializes_type_and_camel_case() {
    let file = File {
        id: 1,
        project_id: 2,
        folder_id: None,
        name: "robot.fbx".into(),
        file_type: FileType::Model,
        file_extension: "fbx".into(),
        path: "/robot.fbx".into(),
        size: 2048,
        metadata: None,
        current_version_id: Some(7),
        created_at: datetime!(2025-04-02 10:00 UTC),
        updated_at: datetime!(2025-04-02 10:00 UTC),
    };
    let json = serde_json::to_value(&file).expect("json");
    assert_eq!(json["type"], "model");
    assert_eq!(json["projectId"], 2);
    assert_eq!(json["currentVersionId"], 7);
    assert_eq!(json["createdAt"], "2025-04-02T10:00:00Z");
}

#[test]
fn member_with_user_flattens_membership() {
    let member = MemberWithUser {
        member: ProjectMember {
            id: 1,
            project_id: 2,
            user_id: 4,
            role: "Lead".into(),
            joined_at: datetime!(2025-04-02 00:00 UTC),
        },
        user: user(),
    };
    let json = serde_json::to_value(&member).expect("json");
    assert_eq!(json["role"], "Lead");
    assert_eq!(json["userId"], 4);
    assert_eq!(json["user"]["fullName"], "John Doe");
}

#[test]
fn entity_labels_are_capitalized() {
    assert_eq!(EntityKind::Project.label(), "Project");
    assert_eq!(EntityKind::FileActivity.label(), "File activity");
    assert_eq!(EntityKind::FileVersion.to_string(), "file version");
}
