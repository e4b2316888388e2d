//! In-memory store: arena tables behind one async lock.
//!
//! DESIGN
//! ======
//! Each table is a `BTreeMap` keyed by id with its own sequence. Hierarchy
//! (folders) is an arena with parent-id indices, never back-pointers. The
//! foreign-key behavior of the Postgres schema is reproduced in code:
//! missing parents are constraint violations, deletes cascade down the
//! ownership tree, and optional references are nulled.
//!
//! Every call takes the write (or read) lock once, so each call is atomic.

use std::collections::{BTreeMap, BTreeSet};

use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{Store, StoreError, version_activity_details};
use crate::models::input::{
    CommentPatch, FileActivityPatch, FilePatch, FileVersionPatch, FolderPatch, MemberPatch, MilestonePatch, NewComment,
    NewFile, NewFileActivity, NewFileVersion, NewFolder, NewMember, NewMilestone, NewProject, NewTask, NewUser,
    ProjectPatch, TaskPatch, UserPatch,
};
use crate::models::{
    Comment, File, FileActivity, FileVersion, Folder, Id, MemberWithUser, Milestone, Project, ProjectMember, Task,
    User,
};

// =============================================================================
// TABLES
// =============================================================================

struct Table<T> {
    rows: BTreeMap<Id, T>,
    last_id: Id,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { rows: BTreeMap::new(), last_id: 0 }
    }
}

impl<T: Clone> Table<T> {
    fn next_id(&mut self) -> Id {
        self.last_id += 1;
        self.last_id
    }

    fn get(&self, id: Id) -> Option<&T> {
        self.rows.get(&id)
    }

    fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    fn contains(&self, id: Id) -> bool {
        self.rows.contains_key(&id)
    }

    fn insert(&mut self, id: Id, row: T) -> T {
        self.rows.insert(id, row.clone());
        row
    }

    fn remove(&mut self, id: Id) -> bool {
        self.rows.remove(&id).is_some()
    }

    fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.values_mut()
    }

    fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        self.rows.retain(|_, row| keep(row));
    }

    fn filtered(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|row| keep(row)).cloned().collect()
    }
}

#[derive(Default)]
struct Tables {
    users: Table<User>,
    projects: Table<Project>,
    members: Table<ProjectMember>,
    milestones: Table<Milestone>,
    tasks: Table<Task>,
    folders: Table<Folder>,
    files: Table<File>,
    versions: Table<FileVersion>,
    activities: Table<FileActivity>,
    comments: Table<Comment>,
}

impl Tables {
    fn remove_file_cascade(&mut self, file_id: Id) -> bool {
        if !self.files.remove(file_id) {
            return false;
        }
        self.versions.retain(|v| v.file_id != file_id);
        self.activities.retain(|a| a.file_id != file_id);
        self.comments.retain(|c| c.file_id != Some(file_id));
        true
    }

    fn remove_task_cascade(&mut self, task_id: Id) -> bool {
        if !self.tasks.remove(task_id) {
            return false;
        }
        self.comments.retain(|c| c.task_id != Some(task_id));
        true
    }

    /// True if `folder_id` is `candidate` or sits above it, so parenting
    /// `folder_id` under `candidate` would close a loop.
    fn is_self_or_ancestor(&self, folder_id: Id, candidate: Id) -> bool {
        let mut seen = BTreeSet::new();
        let mut cursor = Some(candidate);
        while let Some(current) = cursor {
            if current == folder_id || !seen.insert(current) {
                return true;
            }
            cursor = self.folders.get(current).and_then(|f| f.parent_id);
        }
        false
    }

    /// `folder_id` plus every folder below it.
    fn folder_subtree(&self, folder_id: Id) -> BTreeSet<Id> {
        let mut subtree = BTreeSet::from([folder_id]);
        let mut frontier = vec![folder_id];
        while let Some(parent) = frontier.pop() {
            for child in self.folders.values().filter(|f| f.parent_id == Some(parent)) {
                if subtree.insert(child.id) {
                    frontier.push(child.id);
                }
            }
        }
        subtree
    }

    fn remove_folder_cascade(&mut self, folder_id: Id) -> bool {
        if !self.folders.contains(folder_id) {
            return false;
        }
        let subtree = self.folder_subtree(folder_id);
        let doomed_files: Vec<Id> = self
            .files
            .values()
            .filter(|f| f.folder_id.is_some_and(|id| subtree.contains(&id)))
            .map(|f| f.id)
            .collect();
        for file_id in doomed_files {
            self.remove_file_cascade(file_id);
        }
        self.folders.retain(|f| !subtree.contains(&f.id));
        true
    }

    fn remove_project_cascade(&mut self, project_id: Id) -> bool {
        if !self.projects.remove(project_id) {
            return false;
        }
        self.members.retain(|m| m.project_id != project_id);
        self.milestones.retain(|m| m.project_id != project_id);
        let tasks: Vec<Id> = self.tasks.filtered(|t| t.project_id == project_id).iter().map(|t| t.id).collect();
        for task_id in tasks {
            self.remove_task_cascade(task_id);
        }
        let files: Vec<Id> = self.files.filtered(|f| f.project_id == project_id).iter().map(|f| f.id).collect();
        for file_id in files {
            self.remove_file_cascade(file_id);
        }
        self.folders.retain(|f| f.project_id != project_id);
        true
    }

    fn require_project(&self, project_id: Id) -> Result<(), StoreError> {
        if self.projects.contains(project_id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!("project {project_id} does not exist")))
        }
    }

    fn require_file(&self, file_id: Id) -> Result<(), StoreError> {
        if self.files.contains(file_id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!("file {file_id} does not exist")))
        }
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Ascending by an optional date with `None` last, then by id. Matches
/// Postgres `ORDER BY due_date` default null ordering.
fn nulls_last_key(date: Option<OffsetDateTime>, id: Id) -> (bool, Option<OffsetDateTime>, Id) {
    (date.is_none(), date, id)
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables.read().await.users.filtered(|_| true))
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == new.username) {
            return Err(StoreError::Constraint(format!("username {} already exists", new.username)));
        }
        let id = tables.users.next_id();
        Ok(tables.users.insert(
            id,
            User {
                id,
                username: new.username,
                full_name: new.full_name,
                email: new.email,
                avatar: new.avatar,
                role: new.role,
            },
        ))
    }

    async fn update_user(&self, id: Id, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(username) = patch.username.as_deref() {
            if tables.users.values().any(|u| u.username == username && u.id != id) {
                return Err(StoreError::Constraint(format!("username {username} already exists")));
            }
        }
        Ok(tables.users.get_mut(id).map(|user| {
            patch.apply(user);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Id) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.remove(id) {
            return Ok(false);
        }
        tables.members.retain(|m| m.user_id != id);
        tables.comments.retain(|c| c.user_id != id);
        for task in tables.tasks.values_mut().filter(|t| t.assignee_id == Some(id)) {
            task.assignee_id = None;
        }
        for version in tables.versions.values_mut().filter(|v| v.created_by_id == Some(id)) {
            version.created_by_id = None;
        }
        for activity in tables.activities.values_mut().filter(|a| a.user_id == Some(id)) {
            activity.user_id = None;
        }
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------------

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut projects = self.tables.read().await.projects.filtered(|_| true);
        projects.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(projects)
    }

    async fn get_project(&self, id: Id) -> Result<Option<Project>, StoreError> {
        Ok(self.tables.read().await.projects.get(id).cloned())
    }

    async fn create_project(&self, new: NewProject) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.projects.next_id();
        let now = now();
        Ok(tables.projects.insert(
            id,
            Project {
                id,
                name: new.name,
                description: new.description,
                start_date: new.start_date,
                end_date: new.end_date,
                status: new.status,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn update_project(&self, id: Id, patch: ProjectPatch) -> Result<Option<Project>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.projects.get_mut(id).map(|project| {
            patch.apply(project);
            project.updated_at = now();
            project.clone()
        }))
    }

    async fn delete_project(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.remove_project_cascade(id))
    }

    // -------------------------------------------------------------------------
    // Members
    // -------------------------------------------------------------------------

    async fn list_members(&self, project_id: Id) -> Result<Vec<MemberWithUser>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .values()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| {
                tables
                    .users
                    .get(m.user_id)
                    .map(|user| MemberWithUser { member: m.clone(), user: user.clone() })
            })
            .collect())
    }

    async fn get_member(&self, project_id: Id, user_id: Id) -> Result<Option<ProjectMember>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .values()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn add_member(&self, new: NewMember) -> Result<ProjectMember, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_project(new.project_id)?;
        if !tables.users.contains(new.user_id) {
            return Err(StoreError::Constraint(format!("user {} does not exist", new.user_id)));
        }
        if tables
            .members
            .values()
            .any(|m| m.project_id == new.project_id && m.user_id == new.user_id)
        {
            return Err(StoreError::Constraint(format!(
                "user {} is already a member of project {}",
                new.user_id, new.project_id
            )));
        }
        let id = tables.members.next_id();
        Ok(tables.members.insert(
            id,
            ProjectMember { id, project_id: new.project_id, user_id: new.user_id, role: new.role, joined_at: now() },
        ))
    }

    async fn update_member(
        &self,
        project_id: Id,
        user_id: Id,
        patch: MemberPatch,
    ) -> Result<Option<ProjectMember>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .members
            .values_mut()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .map(|member| {
                patch.apply(member);
                member.clone()
            }))
    }

    async fn remove_member(&self, project_id: Id, user_id: Id) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.members.rows.len();
        tables
            .members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(tables.members.rows.len() < before)
    }

    // -------------------------------------------------------------------------
    // Milestones
    // -------------------------------------------------------------------------

    async fn list_milestones(&self, project_id: Id) -> Result<Vec<Milestone>, StoreError> {
        let mut milestones = self.tables.read().await.milestones.filtered(|m| m.project_id == project_id);
        milestones.sort_by_key(|m| nulls_last_key(m.due_date, m.id));
        Ok(milestones)
    }

    async fn get_milestone(&self, id: Id) -> Result<Option<Milestone>, StoreError> {
        Ok(self.tables.read().await.milestones.get(id).cloned())
    }

    async fn create_milestone(&self, new: NewMilestone) -> Result<Milestone, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_project(new.project_id)?;
        let id = tables.milestones.next_id();
        Ok(tables.milestones.insert(
            id,
            Milestone {
                id,
                project_id: new.project_id,
                name: new.name,
                description: new.description,
                due_date: new.due_date,
                completed: new.completed,
                created_at: now(),
            },
        ))
    }

    async fn update_milestone(&self, id: Id, patch: MilestonePatch) -> Result<Option<Milestone>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.milestones.get_mut(id).map(|milestone| {
            patch.apply(milestone);
            milestone.clone()
        }))
    }

    async fn delete_milestone(&self, id: Id) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.milestones.remove(id) {
            return Ok(false);
        }
        for task in tables.tasks.values_mut().filter(|t| t.milestone_id == Some(id)) {
            task.milestone_id = None;
        }
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------------

    async fn list_tasks(&self, project_id: Id, milestone_id: Option<Id>) -> Result<Vec<Task>, StoreError> {
        let mut tasks = self.tables.read().await.tasks.filtered(|t| {
            t.project_id == project_id && milestone_id.is_none_or(|m| t.milestone_id == Some(m))
        });
        tasks.sort_by_key(|t| nulls_last_key(t.due_date, t.id));
        Ok(tasks)
    }

    async fn get_task(&self, id: Id) -> Result<Option<Task>, StoreError> {
        Ok(self.tables.read().await.tasks.get(id).cloned())
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_project(new.project_id)?;
        let id = tables.tasks.next_id();
        let now = now();
        Ok(tables.tasks.insert(
            id,
            Task {
                id,
                project_id: new.project_id,
                milestone_id: new.milestone_id,
                assignee_id: new.assignee_id,
                title: new.title,
                description: new.description,
                status: new.status,
                priority: new.priority,
                due_date: new.due_date,
                estimated_hours: new.estimated_hours,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn update_task(&self, id: Id, patch: TaskPatch) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.tasks.get_mut(id).map(|task| {
            patch.apply(task);
            task.updated_at = now();
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.remove_task_cascade(id))
    }

    // -------------------------------------------------------------------------
    // Folders
    // -------------------------------------------------------------------------

    async fn list_folders(&self, project_id: Id, parent_id: Option<Id>) -> Result<Vec<Folder>, StoreError> {
        let mut folders = self.tables.read().await.folders.filtered(|f| {
            f.project_id == project_id && parent_id.is_none_or(|p| f.parent_id == Some(p))
        });
        folders.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(folders)
    }

    async fn get_folder(&self, id: Id) -> Result<Option<Folder>, StoreError> {
        Ok(self.tables.read().await.folders.get(id).cloned())
    }

    async fn create_folder(&self, new: NewFolder) -> Result<Folder, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_project(new.project_id)?;
        if let Some(parent_id) = new.parent_id {
            if !tables.folders.contains(parent_id) {
                return Err(StoreError::Constraint(format!("folder {parent_id} does not exist")));
            }
        }
        let id = tables.folders.next_id();
        let now = now();
        Ok(tables.folders.insert(
            id,
            Folder {
                id,
                project_id: new.project_id,
                name: new.name,
                parent_id: new.parent_id,
                path: new.path,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn update_folder(&self, id: Id, patch: FolderPatch) -> Result<Option<Folder>, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(Some(parent_id)) = patch.parent_id {
            if !tables.folders.contains(parent_id) {
                return Err(StoreError::Constraint(format!("folder {parent_id} does not exist")));
            }
            if tables.is_self_or_ancestor(id, parent_id) {
                return Err(StoreError::FolderCycle { folder_id: id, parent_id });
            }
        }
        Ok(tables.folders.get_mut(id).map(|folder| {
            patch.apply(folder);
            folder.updated_at = now();
            folder.clone()
        }))
    }

    async fn delete_folder(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.remove_folder_cascade(id))
    }

    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------

    async fn list_files(&self, project_id: Id, folder_id: Option<Id>) -> Result<Vec<File>, StoreError> {
        let mut files = self.tables.read().await.files.filtered(|f| {
            f.project_id == project_id && folder_id.is_none_or(|d| f.folder_id == Some(d))
        });
        files.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(files)
    }

    async fn get_file(&self, id: Id) -> Result<Option<File>, StoreError> {
        Ok(self.tables.read().await.files.get(id).cloned())
    }

    async fn create_file(&self, new: NewFile) -> Result<File, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_project(new.project_id)?;
        if let Some(folder_id) = new.folder_id {
            if !tables.folders.contains(folder_id) {
                return Err(StoreError::Constraint(format!("folder {folder_id} does not exist")));
            }
        }
        let id = tables.files.next_id();
        let now = now();
        Ok(tables.files.insert(
            id,
            File {
                id,
                project_id: new.project_id,
                folder_id: new.folder_id,
                name: new.name,
                file_type: new.file_type,
                file_extension: new.file_extension,
                path: new.path,
                size: new.size,
                metadata: new.metadata,
                current_version_id: None,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn update_file(&self, id: Id, patch: FilePatch) -> Result<Option<File>, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(Some(folder_id)) = patch.folder_id {
            if !tables.folders.contains(folder_id) {
                return Err(StoreError::Constraint(format!("folder {folder_id} does not exist")));
            }
        }
        Ok(tables.files.get_mut(id).map(|file| {
            patch.apply(file);
            file.updated_at = now();
            file.clone()
        }))
    }

    async fn delete_file(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.remove_file_cascade(id))
    }

    // -------------------------------------------------------------------------
    // File versions
    // -------------------------------------------------------------------------

    async fn list_file_versions(&self, file_id: Id) -> Result<Vec<FileVersion>, StoreError> {
        let mut versions = self.tables.read().await.versions.filtered(|v| v.file_id == file_id);
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn get_file_version(&self, id: Id) -> Result<Option<FileVersion>, StoreError> {
        Ok(self.tables.read().await.versions.get(id).cloned())
    }

    async fn record_file_version(&self, new: NewFileVersion) -> Result<Option<FileVersion>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(file) = tables.files.get(new.file_id).cloned() else {
            return Ok(None);
        };

        let existing: BTreeSet<i32> = tables
            .versions
            .values()
            .filter(|v| v.file_id == file.id)
            .map(|v| v.version_number)
            .collect();
        let version_number = match new.version_number {
            Some(number) if existing.contains(&number) => {
                return Err(StoreError::Constraint(format!(
                    "file {} already has version {number}",
                    file.id
                )));
            }
            Some(number) => number,
            None => existing
                .last()
                .copied()
                .unwrap_or(0)
                .checked_add(1)
                .ok_or(StoreError::VersionsExhausted(file.id))?,
        };

        let now = now();
        let id = tables.versions.next_id();
        let version = tables.versions.insert(
            id,
            FileVersion {
                id,
                file_id: file.id,
                version_number,
                created_by_id: new.created_by_id,
                path: new.path.unwrap_or_else(|| file.path.clone()),
                size: new.size.unwrap_or(file.size),
                metadata: new.metadata,
                change_description: new.change_description,
                created_at: now,
            },
        );

        if let Some(file) = tables.files.get_mut(file.id) {
            file.current_version_id = Some(version.id);
            file.path.clone_from(&version.path);
            file.size = version.size;
            file.updated_at = now;
        }

        let activity_id = tables.activities.next_id();
        tables.activities.insert(
            activity_id,
            FileActivity {
                id: activity_id,
                file_id: file.id,
                user_id: version.created_by_id,
                action: "version".to_owned(),
                details: Some(version_activity_details(&version)),
                created_at: now,
            },
        );

        Ok(Some(version))
    }

    async fn update_file_version(&self, id: Id, patch: FileVersionPatch) -> Result<Option<FileVersion>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.versions.get_mut(id).map(|version| {
            patch.apply(version);
            version.clone()
        }))
    }

    async fn delete_file_version(&self, id: Id) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.versions.remove(id) {
            return Ok(false);
        }
        for file in tables.files.values_mut().filter(|f| f.current_version_id == Some(id)) {
            file.current_version_id = None;
        }
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // File activities
    // -------------------------------------------------------------------------

    async fn list_file_activities(&self, file_id: Id) -> Result<Vec<FileActivity>, StoreError> {
        let mut activities = self.tables.read().await.activities.filtered(|a| a.file_id == file_id);
        activities.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(activities)
    }

    async fn get_file_activity(&self, id: Id) -> Result<Option<FileActivity>, StoreError> {
        Ok(self.tables.read().await.activities.get(id).cloned())
    }

    async fn create_file_activity(&self, new: NewFileActivity) -> Result<FileActivity, StoreError> {
        let mut tables = self.tables.write().await;
        tables.require_file(new.file_id)?;
        let id = tables.activities.next_id();
        Ok(tables.activities.insert(
            id,
            FileActivity {
                id,
                file_id: new.file_id,
                user_id: new.user_id,
                action: new.action,
                details: new.details,
                created_at: now(),
            },
        ))
    }

    async fn update_file_activity(
        &self,
        id: Id,
        patch: FileActivityPatch,
    ) -> Result<Option<FileActivity>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.activities.get_mut(id).map(|activity| {
            patch.apply(activity);
            activity.clone()
        }))
    }

    async fn delete_file_activity(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.activities.remove(id))
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    async fn list_task_comments(&self, task_id: Id) -> Result<Vec<Comment>, StoreError> {
        let mut comments = self.tables.read().await.comments.filtered(|c| c.task_id == Some(task_id));
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn list_file_comments(&self, file_id: Id) -> Result<Vec<Comment>, StoreError> {
        let mut comments = self.tables.read().await.comments.filtered(|c| c.file_id == Some(file_id));
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn get_comment(&self, id: Id) -> Result<Option<Comment>, StoreError> {
        Ok(self.tables.read().await.comments.get(id).cloned())
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains(new.user_id) {
            return Err(StoreError::Constraint(format!("user {} does not exist", new.user_id)));
        }
        if let Some(task_id) = new.task_id {
            if !tables.tasks.contains(task_id) {
                return Err(StoreError::Constraint(format!("task {task_id} does not exist")));
            }
        }
        if let Some(file_id) = new.file_id {
            tables.require_file(file_id)?;
        }
        let id = tables.comments.next_id();
        let now = now();
        Ok(tables.comments.insert(
            id,
            Comment {
                id,
                task_id: new.task_id,
                file_id: new.file_id,
                user_id: new.user_id,
                content: new.content,
                created_at: now,
                updated_at: now,
            },
        ))
    }

    async fn update_comment(&self, id: Id, patch: CommentPatch) -> Result<Option<Comment>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.comments.get_mut(id).map(|comment| {
            patch.apply(comment);
            comment.updated_at = now();
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: Id) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.comments.remove(id))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
