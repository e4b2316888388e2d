use super::*;
use crate::models::FileType;
use time::macros::datetime;

async fn seed_project(store: &MemoryStore, name: &str) -> Project {
    store
        .create_project(NewProject {
            name: name.to_owned(),
            description: None,
            start_date: datetime!(2025-01-01 00:00 UTC),
            end_date: None,
            status: "active".to_owned(),
        })
        .await
        .expect("create project")
}

async fn seed_user(store: &MemoryStore, username: &str) -> User {
    store
        .create_user(NewUser {
            username: username.to_owned(),
            full_name: format!("{username} Person"),
            email: format!("{username}@example.com"),
            avatar: None,
            role: "member".to_owned(),
        })
        .await
        .expect("create user")
}

async fn seed_folder(store: &MemoryStore, project_id: Id, name: &str, parent_id: Option<Id>) -> Folder {
    store
        .create_folder(NewFolder { project_id, name: name.to_owned(), parent_id, path: format!("/{name}") })
        .await
        .expect("create folder")
}

async fn seed_file(store: &MemoryStore, project_id: Id, folder_id: Option<Id>, name: &str) -> File {
    store
        .create_file(NewFile {
            project_id,
            folder_id,
            name: name.to_owned(),
            file_type: FileType::Model,
            file_extension: "fbx".to_owned(),
            path: format!("/assets/{name}"),
            size: 1024,
            metadata: None,
        })
        .await
        .expect("create file")
}

fn new_task(project_id: Id, title: &str, milestone_id: Option<Id>, due: Option<OffsetDateTime>) -> NewTask {
    NewTask {
        project_id,
        milestone_id,
        assignee_id: None,
        title: title.to_owned(),
        description: None,
        status: crate::models::TaskStatus::Todo,
        priority: "medium".to_owned(),
        due_date: due,
        estimated_hours: None,
    }
}

fn new_version(file_id: Id, number: Option<i32>) -> NewFileVersion {
    NewFileVersion {
        file_id,
        version_number: number,
        created_by_id: None,
        path: None,
        size: None,
        metadata: None,
        change_description: Some("tweak".to_owned()),
    }
}

// =============================================================================
// IDS AND CONSTRAINTS
// =============================================================================

#[tokio::test]
async fn ids_are_assigned_sequentially_per_table() {
    let store = MemoryStore::new();
    let a = seed_project(&store, "A").await;
    let b = seed_project(&store, "B").await;
    let user = seed_user(&store, "ana").await;
    assert_eq!(a.id, 1);
    assert_eq!(b.id, 2);
    assert_eq!(user.id, 1);
}

#[tokio::test]
async fn duplicate_username_is_a_constraint_violation() {
    let store = MemoryStore::new();
    seed_user(&store, "ana").await;
    let err = store
        .create_user(NewUser {
            username: "ana".to_owned(),
            full_name: "Another Ana".to_owned(),
            email: "ana2@example.com".to_owned(),
            avatar: None,
            role: "member".to_owned(),
        })
        .await
        .expect_err("duplicate username should fail");
    assert!(matches!(err, StoreError::Constraint(_)));
}

#[tokio::test]
async fn child_rows_require_an_existing_project() {
    let store = MemoryStore::new();
    let err = store
        .create_milestone(NewMilestone {
            project_id: 42,
            name: "Blockout".to_owned(),
            description: None,
            due_date: None,
            completed: false,
        })
        .await
        .expect_err("missing project should fail");
    assert!(matches!(err, StoreError::Constraint(_)));
}

#[tokio::test]
async fn membership_is_unique_per_project_and_user() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let user = seed_user(&store, "ana").await;
    let member = NewMember { project_id: project.id, user_id: user.id, role: "lead".to_owned() };
    store.add_member(member.clone()).await.expect("first add");
    let err = store.add_member(member).await.expect_err("second add should fail");
    assert!(matches!(err, StoreError::Constraint(_)));

    let members = store.list_members(project.id).await.expect("list members");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user.username, "ana");
    assert_eq!(members[0].member.role, "lead");
}

// =============================================================================
// ORDERING AND FILTERS
// =============================================================================

#[tokio::test]
async fn projects_list_newest_first() {
    let store = MemoryStore::new();
    seed_project(&store, "First").await;
    seed_project(&store, "Second").await;
    let names: Vec<String> = store.list_projects().await.expect("list").into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["Second", "First"]);
}

#[tokio::test]
async fn tasks_sort_by_due_date_with_undated_last() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    store.create_task(new_task(project.id, "undated", None, None)).await.expect("task");
    store
        .create_task(new_task(project.id, "late", None, Some(datetime!(2025-03-01 00:00 UTC))))
        .await
        .expect("task");
    store
        .create_task(new_task(project.id, "early", None, Some(datetime!(2025-02-01 00:00 UTC))))
        .await
        .expect("task");

    let titles: Vec<String> =
        store.list_tasks(project.id, None).await.expect("list").into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["early", "late", "undated"]);
}

#[tokio::test]
async fn folder_filter_returns_direct_children_only() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let root = seed_folder(&store, project.id, "models", None).await;
    let child = seed_folder(&store, project.id, "arms", Some(root.id)).await;
    seed_folder(&store, project.id, "joints", Some(child.id)).await;

    let all = store.list_folders(project.id, None).await.expect("list all");
    assert_eq!(all.len(), 3);
    let children = store.list_folders(project.id, Some(root.id)).await.expect("list children");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "arms");
}

// =============================================================================
// CASCADES
// =============================================================================

#[tokio::test]
async fn deleting_a_folder_removes_descendants_and_their_files() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let root = seed_folder(&store, project.id, "models", None).await;
    let child = seed_folder(&store, project.id, "arms", Some(root.id)).await;
    let sibling = seed_folder(&store, project.id, "textures", None).await;
    let deep_file = seed_file(&store, project.id, Some(child.id), "arm.fbx").await;
    let kept_file = seed_file(&store, project.id, Some(sibling.id), "metal.png").await;
    store.record_file_version(new_version(deep_file.id, None)).await.expect("version");

    assert!(store.delete_folder(root.id).await.expect("delete"));

    assert!(store.get_folder(child.id).await.expect("get").is_none());
    assert!(store.get_file(deep_file.id).await.expect("get").is_none());
    assert!(store.list_file_versions(deep_file.id).await.expect("versions").is_empty());
    assert!(store.list_file_activities(deep_file.id).await.expect("activities").is_empty());
    assert!(store.get_folder(sibling.id).await.expect("get").is_some());
    assert!(store.get_file(kept_file.id).await.expect("get").is_some());
}

#[tokio::test]
async fn deleting_a_milestone_detaches_its_tasks() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let milestone = store
        .create_milestone(NewMilestone {
            project_id: project.id,
            name: "Texturing".to_owned(),
            description: None,
            due_date: None,
            completed: false,
        })
        .await
        .expect("milestone");
    let task = store.create_task(new_task(project.id, "paint", Some(milestone.id), None)).await.expect("task");

    assert!(store.delete_milestone(milestone.id).await.expect("delete"));
    let task = store.get_task(task.id).await.expect("get").expect("task survives");
    assert_eq!(task.milestone_id, None);
}

#[tokio::test]
async fn deleting_a_project_removes_everything_it_owns() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let other = seed_project(&store, "Other").await;
    let user = seed_user(&store, "ana").await;
    store
        .add_member(NewMember { project_id: project.id, user_id: user.id, role: "member".to_owned() })
        .await
        .expect("member");
    let task = store.create_task(new_task(project.id, "rig", None, None)).await.expect("task");
    store
        .create_comment(NewComment { task_id: Some(task.id), file_id: None, user_id: user.id, content: "hi".to_owned() })
        .await
        .expect("comment");
    let file = seed_file(&store, project.id, None, "bot.fbx").await;
    let other_file = seed_file(&store, other.id, None, "other.fbx").await;

    assert!(store.delete_project(project.id).await.expect("delete"));
    assert!(!store.delete_project(project.id).await.expect("delete again"));

    assert!(store.list_members(project.id).await.expect("members").is_empty());
    assert!(store.get_task(task.id).await.expect("task").is_none());
    assert!(store.list_task_comments(task.id).await.expect("comments").is_empty());
    assert!(store.get_file(file.id).await.expect("file").is_none());
    assert!(store.get_file(other_file.id).await.expect("other file").is_some());
    assert!(store.get_user(user.id).await.expect("user").is_some());
}

#[tokio::test]
async fn deleting_a_user_nulls_optional_references() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let user = seed_user(&store, "ana").await;
    let mut task = new_task(project.id, "rig", None, None);
    task.assignee_id = Some(user.id);
    let task = store.create_task(task).await.expect("task");
    let file = seed_file(&store, project.id, None, "bot.fbx").await;
    let mut version = new_version(file.id, None);
    version.created_by_id = Some(user.id);
    let version = store.record_file_version(version).await.expect("record").expect("file exists");

    assert!(store.delete_user(user.id).await.expect("delete"));

    assert_eq!(store.get_task(task.id).await.expect("task").expect("task").assignee_id, None);
    let version = store.get_file_version(version.id).await.expect("version").expect("version");
    assert_eq!(version.created_by_id, None);
    let activities = store.list_file_activities(file.id).await.expect("activities");
    assert!(activities.iter().all(|a| a.user_id.is_none()));
}

// =============================================================================
// VERSIONS
// =============================================================================

#[tokio::test]
async fn record_file_version_numbers_and_repoints_the_file() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let file = seed_file(&store, project.id, None, "bot.fbx").await;

    let first = store.record_file_version(new_version(file.id, None)).await.expect("record").expect("file");
    let mut second = new_version(file.id, None);
    second.path = Some("/assets/bot_v2.fbx".to_owned());
    second.size = Some(4096);
    let second = store.record_file_version(second).await.expect("record").expect("file");

    assert_eq!(first.version_number, 1);
    assert_eq!(first.path, "/assets/bot.fbx");
    assert_eq!(first.size, 1024);
    assert_eq!(second.version_number, 2);

    let file = store.get_file(file.id).await.expect("get").expect("file");
    assert_eq!(file.current_version_id, Some(second.id));
    assert_eq!(file.path, "/assets/bot_v2.fbx");
    assert_eq!(file.size, 4096);

    let numbers: Vec<i32> =
        store.list_file_versions(file.id).await.expect("list").iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![2, 1]);

    let activities = store.list_file_activities(file.id).await.expect("activities");
    assert_eq!(activities.len(), 2);
    assert!(activities.iter().all(|a| a.action == "version"));
    let details = activities[0].details.as_ref().expect("details");
    assert_eq!(details["versionNumber"], 2);
}

#[tokio::test]
async fn record_file_version_rejects_a_taken_number() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let file = seed_file(&store, project.id, None, "bot.fbx").await;
    store.record_file_version(new_version(file.id, Some(3))).await.expect("record");

    let err = store.record_file_version(new_version(file.id, Some(3))).await.expect_err("duplicate");
    assert!(matches!(err, StoreError::Constraint(_)));
    assert_eq!(store.list_file_activities(file.id).await.expect("activities").len(), 1);
}

#[tokio::test]
async fn auto_number_follows_the_highest_explicit_number() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let file = seed_file(&store, project.id, None, "bot.fbx").await;
    store.record_file_version(new_version(file.id, Some(5))).await.expect("record");
    store.record_file_version(new_version(file.id, Some(2))).await.expect("record");

    let next = store.record_file_version(new_version(file.id, None)).await.expect("record").expect("file");
    assert_eq!(next.version_number, 6);

    let err = store.record_file_version(new_version(file.id, Some(6))).await.expect_err("taken");
    assert!(matches!(err, StoreError::Constraint(_)));
}

#[tokio::test]
async fn auto_number_past_the_maximum_is_rejected_untouched() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let file = seed_file(&store, project.id, None, "bot.fbx").await;
    let top = store
        .record_file_version(new_version(file.id, Some(i32::MAX)))
        .await
        .expect("record")
        .expect("file");

    let err = store.record_file_version(new_version(file.id, None)).await.expect_err("exhausted");
    assert!(matches!(err, StoreError::VersionsExhausted(id) if id == file.id));

    let file = store.get_file(file.id).await.expect("get").expect("file");
    assert_eq!(file.current_version_id, Some(top.id));
    assert_eq!(store.list_file_versions(file.id).await.expect("versions").len(), 1);
    assert_eq!(store.list_file_activities(file.id).await.expect("activities").len(), 1);
}

#[tokio::test]
async fn record_file_version_for_missing_file_is_none() {
    let store = MemoryStore::new();
    assert!(store.record_file_version(new_version(9, None)).await.expect("record").is_none());
}

#[tokio::test]
async fn deleting_the_current_version_clears_the_pointer() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let file = seed_file(&store, project.id, None, "bot.fbx").await;
    let version = store.record_file_version(new_version(file.id, None)).await.expect("record").expect("file");

    assert!(store.delete_file_version(version.id).await.expect("delete"));
    let file = store.get_file(file.id).await.expect("get").expect("file");
    assert_eq!(file.current_version_id, None);
}

// =============================================================================
// UPDATES
// =============================================================================

#[tokio::test]
async fn patch_clears_nullable_fields_and_keeps_absent_ones() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    store
        .update_project(
            project.id,
            ProjectPatch { description: Some(Some("A robot".to_owned())), ..ProjectPatch::default() },
        )
        .await
        .expect("update");
    let updated = store
        .update_project(project.id, ProjectPatch { description: Some(None), ..ProjectPatch::default() })
        .await
        .expect("update")
        .expect("project");
    assert_eq!(updated.description, None);
    assert_eq!(updated.name, "Robot");
    assert!(updated.updated_at >= project.updated_at);
}

#[tokio::test]
async fn updating_a_missing_row_returns_none() {
    let store = MemoryStore::new();
    let result = store.update_task(7, TaskPatch::default()).await.expect("update");
    assert!(result.is_none());
    assert!(!store.delete_comment(7).await.expect("delete"));
}

#[tokio::test]
async fn folder_update_rejects_a_cycle_on_its_own() {
    let store = MemoryStore::new();
    let project = seed_project(&store, "Robot").await;
    let root = seed_folder(&store, project.id, "models", None).await;
    let child = seed_folder(&store, project.id, "arms", Some(root.id)).await;
    let grandchild = seed_folder(&store, project.id, "joints", Some(child.id)).await;

    for parent_id in [root.id, grandchild.id] {
        let patch = FolderPatch { parent_id: Some(Some(parent_id)), ..FolderPatch::default() };
        let err = store.update_folder(root.id, patch).await.expect_err("cycle");
        assert!(matches!(err, StoreError::FolderCycle { folder_id, .. } if folder_id == root.id));
    }
    let root = store.get_folder(root.id).await.expect("get").expect("root");
    assert_eq!(root.parent_id, None);

    // Crossing moves: the second one would close the loop.
    let other = seed_folder(&store, project.id, "textures", None).await;
    let patch = FolderPatch { parent_id: Some(Some(other.id)), ..FolderPatch::default() };
    store.update_folder(root.id, patch).await.expect("root under textures");
    let patch = FolderPatch { parent_id: Some(Some(root.id)), ..FolderPatch::default() };
    let err = store.update_folder(other.id, patch).await.expect_err("textures under root");
    assert!(matches!(err, StoreError::FolderCycle { .. }));
}
