//! Persistence collaborator behind the CRUD gateway.
//!
//! ARCHITECTURE
//! ============
//! `Store` is the typed create/read/update/delete seam over the relational
//! store. `postgres::PgStore` is the production implementation (foreign keys
//! carry the cascade rules); `memory::MemoryStore` keeps arena tables behind
//! one lock and applies the same cascades in code. It backs the demo mode and
//! every test that needs a store.
//!
//! Lists scoped by an optional parent return the whole project when the
//! parent is `None` and only direct children otherwise.

pub mod memory;
pub mod postgres;

use crate::models::input::{
    CommentPatch, FileActivityPatch, FilePatch, FileVersionPatch, FolderPatch, MemberPatch, MilestonePatch, NewComment,
    NewFile, NewFileActivity, NewFileVersion, NewFolder, NewMember, NewMilestone, NewProject, NewTask, NewUser,
    ProjectPatch, TaskPatch, UserPatch,
};
use crate::models::{
    Comment, File, FileActivity, FileVersion, Folder, Id, MemberWithUser, Milestone, Project, ProjectMember, Task,
    User,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("file {0} has no version numbers left")]
    VersionsExhausted(Id),
    #[error("folder {folder_id} cannot move under its own descendant {parent_id}")]
    FolderCycle { folder_id: Id, parent_id: Id },
}

/// Typed CRUD calls, one per store round-trip. Every call is atomic on its
/// own; `record_file_version` is the one multi-row write.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn get_user(&self, id: Id) -> Result<Option<User>, StoreError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn update_user(&self, id: Id, patch: UserPatch) -> Result<Option<User>, StoreError>;
    async fn delete_user(&self, id: Id) -> Result<bool, StoreError>;

    // Projects
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
    async fn get_project(&self, id: Id) -> Result<Option<Project>, StoreError>;
    async fn create_project(&self, new: NewProject) -> Result<Project, StoreError>;
    async fn update_project(&self, id: Id, patch: ProjectPatch) -> Result<Option<Project>, StoreError>;
    async fn delete_project(&self, id: Id) -> Result<bool, StoreError>;

    // Members
    async fn list_members(&self, project_id: Id) -> Result<Vec<MemberWithUser>, StoreError>;
    async fn get_member(&self, project_id: Id, user_id: Id) -> Result<Option<ProjectMember>, StoreError>;
    async fn add_member(&self, new: NewMember) -> Result<ProjectMember, StoreError>;
    async fn update_member(
        &self,
        project_id: Id,
        user_id: Id,
        patch: MemberPatch,
    ) -> Result<Option<ProjectMember>, StoreError>;
    async fn remove_member(&self, project_id: Id, user_id: Id) -> Result<bool, StoreError>;

    // Milestones
    async fn list_milestones(&self, project_id: Id) -> Result<Vec<Milestone>, StoreError>;
    async fn get_milestone(&self, id: Id) -> Result<Option<Milestone>, StoreError>;
    async fn create_milestone(&self, new: NewMilestone) -> Result<Milestone, StoreError>;
    async fn update_milestone(&self, id: Id, patch: MilestonePatch) -> Result<Option<Milestone>, StoreError>;
    async fn delete_milestone(&self, id: Id) -> Result<bool, StoreError>;

    // Tasks
    async fn list_tasks(&self, project_id: Id, milestone_id: Option<Id>) -> Result<Vec<Task>, StoreError>;
    async fn get_task(&self, id: Id) -> Result<Option<Task>, StoreError>;
    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError>;
    async fn update_task(&self, id: Id, patch: TaskPatch) -> Result<Option<Task>, StoreError>;
    async fn delete_task(&self, id: Id) -> Result<bool, StoreError>;

    // Folders
    async fn list_folders(&self, project_id: Id, parent_id: Option<Id>) -> Result<Vec<Folder>, StoreError>;
    async fn get_folder(&self, id: Id) -> Result<Option<Folder>, StoreError>;
    async fn create_folder(&self, new: NewFolder) -> Result<Folder, StoreError>;
    async fn update_folder(&self, id: Id, patch: FolderPatch) -> Result<Option<Folder>, StoreError>;
    async fn delete_folder(&self, id: Id) -> Result<bool, StoreError>;

    // Files
    async fn list_files(&self, project_id: Id, folder_id: Option<Id>) -> Result<Vec<File>, StoreError>;
    async fn get_file(&self, id: Id) -> Result<Option<File>, StoreError>;
    async fn create_file(&self, new: NewFile) -> Result<File, StoreError>;
    async fn update_file(&self, id: Id, patch: FilePatch) -> Result<Option<File>, StoreError>;
    async fn delete_file(&self, id: Id) -> Result<bool, StoreError>;

    // File versions
    async fn list_file_versions(&self, file_id: Id) -> Result<Vec<FileVersion>, StoreError>;
    async fn get_file_version(&self, id: Id) -> Result<Option<FileVersion>, StoreError>;
    /// Insert a version, point the file at it, and log a `version` activity,
    /// all or nothing. Returns `None` if the file does not exist.
    async fn record_file_version(&self, new: NewFileVersion) -> Result<Option<FileVersion>, StoreError>;
    async fn update_file_version(&self, id: Id, patch: FileVersionPatch) -> Result<Option<FileVersion>, StoreError>;
    async fn delete_file_version(&self, id: Id) -> Result<bool, StoreError>;

    // File activities
    async fn list_file_activities(&self, file_id: Id) -> Result<Vec<FileActivity>, StoreError>;
    async fn get_file_activity(&self, id: Id) -> Result<Option<FileActivity>, StoreError>;
    async fn create_file_activity(&self, new: NewFileActivity) -> Result<FileActivity, StoreError>;
    async fn update_file_activity(
        &self,
        id: Id,
        patch: FileActivityPatch,
    ) -> Result<Option<FileActivity>, StoreError>;
    async fn delete_file_activity(&self, id: Id) -> Result<bool, StoreError>;

    // Comments
    async fn list_task_comments(&self, task_id: Id) -> Result<Vec<Comment>, StoreError>;
    async fn list_file_comments(&self, file_id: Id) -> Result<Vec<Comment>, StoreError>;
    async fn get_comment(&self, id: Id) -> Result<Option<Comment>, StoreError>;
    async fn create_comment(&self, new: NewComment) -> Result<Comment, StoreError>;
    async fn update_comment(&self, id: Id, patch: CommentPatch) -> Result<Option<Comment>, StoreError>;
    async fn delete_comment(&self, id: Id) -> Result<bool, StoreError>;
}

/// Activity details written alongside a recorded version.
#[must_use]
pub(crate) fn version_activity_details(version: &FileVersion) -> serde_json::Value {
    serde_json::json!({
        "versionId": version.id,
        "versionNumber": version.version_number,
        "changeDescription": version.change_description,
    })
}
