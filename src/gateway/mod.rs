//! CRUD gateway: validated façade over the store.
//!
//! ARCHITECTURE
//! ============
//! Every HTTP handler, the dashboard renderer and project import go through
//! `CrudGateway`. Each operation validates its draft or patch, checks the
//! references the store cannot check on its own (same-project parents,
//! folder cycles), calls the store once, and on success invalidates the
//! cached list scopes it touched.
//!
//! ERROR HANDLING
//! ==============
//! Bad input is `Validation`, a missing addressed row is `NotFound`, and any
//! store failure is `Store`. Nothing is retried.

pub mod cache;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::error::{E_NOT_FOUND, E_STORE, E_VALIDATION, ErrorCode};
use crate::models::input::{
    CommentDraft, CommentPatch, FileActivityDraft, FileActivityPatch, FileDraft, FilePatch, FileVersionDraft,
    FileVersionPatch, FolderDraft, FolderPatch, MemberDraft, MemberPatch, MilestoneDraft, MilestonePatch,
    ProjectDraft, ProjectPatch, TaskDraft, TaskPatch, UserDraft, UserPatch, ValidationError, Validator,
};
use crate::models::{
    Comment, EntityKind, File, FileActivity, FileVersion, Folder, Id, MemberWithUser, Milestone, Project,
    ProjectMember, Task, User,
};
use crate::store::{Store, StoreError};
use cache::{QueryCache, QueryKey};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{} not found", .kind.label())]
    NotFound { kind: EntityKind, id: Id },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GatewayError {
    fn not_found(kind: EntityKind, id: Id) -> Self {
        Self::NotFound { kind, id }
    }
}

impl ErrorCode for GatewayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => E_VALIDATION,
            Self::NotFound { .. } => E_NOT_FOUND,
            Self::Store(_) => E_STORE,
        }
    }
}

const FOLDER_CYCLE: &str = "would create a folder cycle";

fn found<T>(row: Option<T>, kind: EntityKind, id: Id) -> Result<T, GatewayError> {
    row.ok_or(GatewayError::not_found(kind, id))
}

// =============================================================================
// GATEWAY
// =============================================================================

#[derive(Clone)]
pub struct CrudGateway {
    store: Arc<dyn Store>,
    cache: QueryCache,
}

impl CrudGateway {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, cache: QueryCache) -> Self {
        Self { store, cache }
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn cached<T, F>(&self, key: QueryKey, load: F) -> Result<Vec<T>, GatewayError>
    where
        T: Clone + Send + Sync + 'static,
        F: Future<Output = Result<Vec<T>, StoreError>>,
    {
        if let Some(rows) = self.cache.get::<T>(&key) {
            return Ok(rows);
        }
        let generation = self.cache.generation();
        let rows = load.await?;
        self.cache.put_if_current(key, generation, rows.clone());
        Ok(rows)
    }

    fn invalidate_tasks(&self, project_id: Id) {
        self.cache
            .invalidate_where(|key| matches!(key, QueryKey::Tasks { project_id: p, .. } if *p == project_id));
    }

    fn invalidate_folders_and_files(&self, project_id: Id) {
        self.cache.invalidate_where(|key| match key {
            QueryKey::Folders { project_id: p, .. } | QueryKey::Files { project_id: p, .. } => *p == project_id,
            _ => false,
        });
    }

    fn invalidate_file_lists(&self, project_id: Id, folder_ids: &[Option<Id>]) {
        let mut keys = vec![QueryKey::Files { project_id, folder_id: None }];
        keys.extend(
            folder_ids
                .iter()
                .flatten()
                .map(|&folder_id| QueryKey::Files { project_id, folder_id: Some(folder_id) }),
        );
        self.cache.invalidate(&keys);
    }

    // -------------------------------------------------------------------------
    // Reference checks
    // -------------------------------------------------------------------------

    async fn require_project(&self, project_id: Id) -> Result<Project, GatewayError> {
        found(self.store.get_project(project_id).await?, EntityKind::Project, project_id)
    }

    async fn require_file(&self, file_id: Id) -> Result<File, GatewayError> {
        found(self.store.get_file(file_id).await?, EntityKind::File, file_id)
    }

    async fn require_task(&self, task_id: Id) -> Result<Task, GatewayError> {
        found(self.store.get_task(task_id).await?, EntityKind::Task, task_id)
    }

    async fn check_user(&self, v: &mut Validator, field: &str, user_id: Option<Id>) -> Result<(), GatewayError> {
        if let Some(user_id) = user_id {
            let exists = self.store.get_user(user_id).await?.is_some();
            v.check(exists, field, "does not exist");
        }
        Ok(())
    }

    async fn check_milestone(
        &self,
        v: &mut Validator,
        project_id: Id,
        milestone_id: Option<Id>,
    ) -> Result<(), GatewayError> {
        if let Some(milestone_id) = milestone_id {
            match self.store.get_milestone(milestone_id).await? {
                None => v.reject("milestoneId", "does not exist"),
                Some(m) => v.check(m.project_id == project_id, "milestoneId", "must belong to the same project"),
            }
        }
        Ok(())
    }

    async fn check_folder(
        &self,
        v: &mut Validator,
        field: &str,
        project_id: Id,
        folder_id: Option<Id>,
    ) -> Result<(), GatewayError> {
        if let Some(folder_id) = folder_id {
            match self.store.get_folder(folder_id).await? {
                None => v.reject(field, "does not exist"),
                Some(f) => v.check(f.project_id == project_id, field, "must belong to the same project"),
            }
        }
        Ok(())
    }

    /// True if `folder_id` is `candidate` or one of its ancestors, i.e.
    /// moving `folder_id` under `candidate` would close a loop.
    async fn would_cycle(&self, folder_id: Id, candidate: Id) -> Result<bool, GatewayError> {
        let mut seen = HashSet::new();
        let mut cursor = Some(candidate);
        while let Some(current) = cursor {
            if current == folder_id || !seen.insert(current) {
                return Ok(true);
            }
            cursor = self.store.get_folder(current).await?.and_then(|f| f.parent_id);
        }
        Ok(false)
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    pub async fn list_users(&self) -> Result<Vec<User>, GatewayError> {
        self.cached(QueryKey::Users, self.store.list_users()).await
    }

    pub async fn get_user(&self, id: Id) -> Result<User, GatewayError> {
        found(self.store.get_user(id).await?, EntityKind::User, id)
    }

    pub async fn create_user(&self, draft: UserDraft) -> Result<User, GatewayError> {
        let new = draft.validate()?;
        if self.store.find_user_by_username(&new.username).await?.is_some() {
            return Err(ValidationError::single("username", "is already taken").into());
        }
        let user = self.store.create_user(new).await?;
        self.cache.invalidate(&[QueryKey::Users]);
        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn update_user(&self, id: Id, patch: UserPatch) -> Result<User, GatewayError> {
        let patch = patch.validate()?;
        if let Some(username) = patch.username.as_deref() {
            if let Some(other) = self.store.find_user_by_username(username).await? {
                if other.id != id {
                    return Err(ValidationError::single("username", "is already taken").into());
                }
            }
        }
        let user = found(self.store.update_user(id, patch).await?, EntityKind::User, id)?;
        // Member lists embed the user row.
        self.cache
            .invalidate_where(|key| matches!(key, QueryKey::Users | QueryKey::Members(_)));
        info!(user_id = id, "user updated");
        Ok(user)
    }

    pub async fn delete_user(&self, id: Id) -> Result<(), GatewayError> {
        if !self.store.delete_user(id).await? {
            return Err(GatewayError::not_found(EntityKind::User, id));
        }
        // Memberships and comments across every project went with the user.
        self.cache.clear();
        info!(user_id = id, "user deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------------

    pub async fn list_projects(&self) -> Result<Vec<Project>, GatewayError> {
        self.cached(QueryKey::Projects, self.store.list_projects()).await
    }

    pub async fn get_project(&self, id: Id) -> Result<Project, GatewayError> {
        self.require_project(id).await
    }

    pub async fn create_project(&self, draft: ProjectDraft) -> Result<Project, GatewayError> {
        let new = draft.validate()?;
        let project = self.store.create_project(new).await?;
        self.cache.invalidate(&[QueryKey::Projects]);
        info!(project_id = project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub async fn update_project(&self, id: Id, patch: ProjectPatch) -> Result<Project, GatewayError> {
        let patch = patch.validate()?;
        let current = self.require_project(id).await?;
        let start = patch.start_date.unwrap_or(current.start_date);
        let end = patch.end_date.unwrap_or(current.end_date);
        if end.is_some_and(|end| end < start) {
            return Err(ValidationError::single("endDate", "must not be before startDate").into());
        }
        let project = found(self.store.update_project(id, patch).await?, EntityKind::Project, id)?;
        self.cache.invalidate(&[QueryKey::Projects]);
        info!(project_id = id, "project updated");
        Ok(project)
    }

    pub async fn delete_project(&self, id: Id) -> Result<(), GatewayError> {
        if !self.store.delete_project(id).await? {
            return Err(GatewayError::not_found(EntityKind::Project, id));
        }
        self.cache.clear();
        info!(project_id = id, "project deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Members
    // -------------------------------------------------------------------------

    pub async fn list_members(&self, project_id: Id) -> Result<Vec<MemberWithUser>, GatewayError> {
        self.require_project(project_id).await?;
        self.cached(QueryKey::Members(project_id), self.store.list_members(project_id))
            .await
    }

    pub async fn get_member(&self, project_id: Id, user_id: Id) -> Result<ProjectMember, GatewayError> {
        self.require_project(project_id).await?;
        found(self.store.get_member(project_id, user_id).await?, EntityKind::Member, user_id)
    }

    pub async fn add_member(&self, project_id: Id, draft: MemberDraft) -> Result<ProjectMember, GatewayError> {
        self.require_project(project_id).await?;
        let new = draft.validate(project_id)?;
        let mut v = Validator::default();
        self.check_user(&mut v, "userId", Some(new.user_id)).await?;
        if v.is_ok() && self.store.get_member(project_id, new.user_id).await?.is_some() {
            v.reject("userId", "is already a member of this project");
        }
        v.finish()?;
        let member = self.store.add_member(new).await?;
        self.cache.invalidate(&[QueryKey::Members(project_id)]);
        info!(project_id, user_id = member.user_id, role = %member.role, "member added");
        Ok(member)
    }

    pub async fn update_member(
        &self,
        project_id: Id,
        user_id: Id,
        patch: MemberPatch,
    ) -> Result<ProjectMember, GatewayError> {
        let patch = patch.validate()?;
        self.require_project(project_id).await?;
        let member = found(
            self.store.update_member(project_id, user_id, patch).await?,
            EntityKind::Member,
            user_id,
        )?;
        self.cache.invalidate(&[QueryKey::Members(project_id)]);
        info!(project_id, user_id, "member updated");
        Ok(member)
    }

    pub async fn remove_member(&self, project_id: Id, user_id: Id) -> Result<(), GatewayError> {
        self.require_project(project_id).await?;
        if !self.store.remove_member(project_id, user_id).await? {
            return Err(GatewayError::not_found(EntityKind::Member, user_id));
        }
        self.cache.invalidate(&[QueryKey::Members(project_id)]);
        info!(project_id, user_id, "member removed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Milestones
    // -------------------------------------------------------------------------

    pub async fn list_milestones(&self, project_id: Id) -> Result<Vec<Milestone>, GatewayError> {
        self.require_project(project_id).await?;
        self.cached(QueryKey::Milestones(project_id), self.store.list_milestones(project_id))
            .await
    }

    pub async fn get_milestone(&self, id: Id) -> Result<Milestone, GatewayError> {
        found(self.store.get_milestone(id).await?, EntityKind::Milestone, id)
    }

    pub async fn create_milestone(&self, project_id: Id, draft: MilestoneDraft) -> Result<Milestone, GatewayError> {
        self.require_project(project_id).await?;
        let new = draft.validate(project_id)?;
        let milestone = self.store.create_milestone(new).await?;
        self.cache.invalidate(&[QueryKey::Milestones(project_id)]);
        info!(project_id, milestone_id = milestone.id, "milestone created");
        Ok(milestone)
    }

    pub async fn update_milestone(&self, id: Id, patch: MilestonePatch) -> Result<Milestone, GatewayError> {
        let patch = patch.validate()?;
        let milestone = found(self.store.update_milestone(id, patch).await?, EntityKind::Milestone, id)?;
        self.cache.invalidate(&[QueryKey::Milestones(milestone.project_id)]);
        info!(milestone_id = id, "milestone updated");
        Ok(milestone)
    }

    pub async fn delete_milestone(&self, id: Id) -> Result<(), GatewayError> {
        let milestone = self.get_milestone(id).await?;
        if !self.store.delete_milestone(id).await? {
            return Err(GatewayError::not_found(EntityKind::Milestone, id));
        }
        self.cache.invalidate(&[QueryKey::Milestones(milestone.project_id)]);
        // Dependent tasks lost their milestone.
        self.invalidate_tasks(milestone.project_id);
        info!(milestone_id = id, "milestone deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------------

    pub async fn list_tasks(&self, project_id: Id, milestone_id: Option<Id>) -> Result<Vec<Task>, GatewayError> {
        self.require_project(project_id).await?;
        self.cached(
            QueryKey::Tasks { project_id, milestone_id },
            self.store.list_tasks(project_id, milestone_id),
        )
        .await
    }

    pub async fn get_task(&self, id: Id) -> Result<Task, GatewayError> {
        self.require_task(id).await
    }

    pub async fn create_task(&self, project_id: Id, draft: TaskDraft) -> Result<Task, GatewayError> {
        self.require_project(project_id).await?;
        let new = draft.validate(project_id)?;
        let mut v = Validator::default();
        self.check_milestone(&mut v, project_id, new.milestone_id).await?;
        self.check_user(&mut v, "assigneeId", new.assignee_id).await?;
        v.finish()?;
        let task = self.store.create_task(new).await?;
        self.cache.invalidate(&[
            QueryKey::Tasks { project_id, milestone_id: None },
            QueryKey::Tasks { project_id, milestone_id: task.milestone_id },
        ]);
        info!(project_id, task_id = task.id, "task created");
        Ok(task)
    }

    pub async fn update_task(&self, id: Id, patch: TaskPatch) -> Result<Task, GatewayError> {
        let patch = patch.validate()?;
        let current = self.require_task(id).await?;
        let mut v = Validator::default();
        if let Some(milestone_id) = patch.milestone_id {
            self.check_milestone(&mut v, current.project_id, milestone_id).await?;
        }
        if let Some(assignee_id) = patch.assignee_id {
            self.check_user(&mut v, "assigneeId", assignee_id).await?;
        }
        v.finish()?;
        let task = found(self.store.update_task(id, patch).await?, EntityKind::Task, id)?;
        self.invalidate_tasks(task.project_id);
        info!(task_id = id, status = task.status.as_str(), "task updated");
        Ok(task)
    }

    pub async fn delete_task(&self, id: Id) -> Result<(), GatewayError> {
        let task = self.require_task(id).await?;
        if !self.store.delete_task(id).await? {
            return Err(GatewayError::not_found(EntityKind::Task, id));
        }
        self.invalidate_tasks(task.project_id);
        self.cache.invalidate(&[QueryKey::TaskComments(id)]);
        info!(task_id = id, "task deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Folders
    // -------------------------------------------------------------------------

    pub async fn list_folders(&self, project_id: Id, parent_id: Option<Id>) -> Result<Vec<Folder>, GatewayError> {
        self.require_project(project_id).await?;
        self.cached(
            QueryKey::Folders { project_id, parent_id },
            self.store.list_folders(project_id, parent_id),
        )
        .await
    }

    pub async fn get_folder(&self, id: Id) -> Result<Folder, GatewayError> {
        found(self.store.get_folder(id).await?, EntityKind::Folder, id)
    }

    pub async fn create_folder(&self, project_id: Id, draft: FolderDraft) -> Result<Folder, GatewayError> {
        self.require_project(project_id).await?;
        let new = draft.validate(project_id)?;
        let mut v = Validator::default();
        self.check_folder(&mut v, "parentId", project_id, new.parent_id).await?;
        v.finish()?;
        let folder = self.store.create_folder(new).await?;
        self.cache.invalidate(&[
            QueryKey::Folders { project_id, parent_id: None },
            QueryKey::Folders { project_id, parent_id: folder.parent_id },
        ]);
        info!(project_id, folder_id = folder.id, path = %folder.path, "folder created");
        Ok(folder)
    }

    pub async fn update_folder(&self, id: Id, patch: FolderPatch) -> Result<Folder, GatewayError> {
        let patch = patch.validate()?;
        let current = self.get_folder(id).await?;
        if let Some(Some(parent_id)) = patch.parent_id {
            let mut v = Validator::default();
            self.check_folder(&mut v, "parentId", current.project_id, Some(parent_id)).await?;
            if v.is_ok() && self.would_cycle(id, parent_id).await? {
                v.reject("parentId", FOLDER_CYCLE);
            }
            v.finish()?;
        }
        // The store re-checks ancestry under its own lock.
        let folder = match self.store.update_folder(id, patch).await {
            Ok(folder) => found(folder, EntityKind::Folder, id)?,
            Err(StoreError::FolderCycle { .. }) => return Err(ValidationError::single("parentId", FOLDER_CYCLE).into()),
            Err(err) => return Err(err.into()),
        };
        self.cache.invalidate(&[
            QueryKey::Folders { project_id: folder.project_id, parent_id: None },
            QueryKey::Folders { project_id: folder.project_id, parent_id: current.parent_id },
            QueryKey::Folders { project_id: folder.project_id, parent_id: folder.parent_id },
        ]);
        info!(folder_id = id, "folder updated");
        Ok(folder)
    }

    pub async fn delete_folder(&self, id: Id) -> Result<(), GatewayError> {
        let folder = self.get_folder(id).await?;
        if !self.store.delete_folder(id).await? {
            return Err(GatewayError::not_found(EntityKind::Folder, id));
        }
        // The whole subtree and its files are gone.
        self.invalidate_folders_and_files(folder.project_id);
        info!(folder_id = id, project_id = folder.project_id, "folder deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------

    pub async fn list_files(&self, project_id: Id, folder_id: Option<Id>) -> Result<Vec<File>, GatewayError> {
        self.require_project(project_id).await?;
        self.cached(
            QueryKey::Files { project_id, folder_id },
            self.store.list_files(project_id, folder_id),
        )
        .await
    }

    pub async fn get_file(&self, id: Id) -> Result<File, GatewayError> {
        self.require_file(id).await
    }

    pub async fn create_file(&self, project_id: Id, draft: FileDraft) -> Result<File, GatewayError> {
        self.require_project(project_id).await?;
        let new = draft.validate(project_id)?;
        let mut v = Validator::default();
        self.check_folder(&mut v, "folderId", project_id, new.folder_id).await?;
        v.finish()?;
        let file = self.store.create_file(new).await?;
        self.invalidate_file_lists(project_id, &[file.folder_id]);
        info!(project_id, file_id = file.id, name = %file.name, "file created");
        Ok(file)
    }

    pub async fn update_file(&self, id: Id, patch: FilePatch) -> Result<File, GatewayError> {
        let patch = patch.validate()?;
        let current = self.require_file(id).await?;
        if let Some(folder_id) = patch.folder_id {
            let mut v = Validator::default();
            self.check_folder(&mut v, "folderId", current.project_id, folder_id).await?;
            v.finish()?;
        }
        let file = found(self.store.update_file(id, patch).await?, EntityKind::File, id)?;
        self.invalidate_file_lists(file.project_id, &[current.folder_id, file.folder_id]);
        info!(file_id = id, "file updated");
        Ok(file)
    }

    pub async fn delete_file(&self, id: Id) -> Result<(), GatewayError> {
        let file = self.require_file(id).await?;
        if !self.store.delete_file(id).await? {
            return Err(GatewayError::not_found(EntityKind::File, id));
        }
        self.invalidate_file_lists(file.project_id, &[file.folder_id]);
        self.cache.invalidate(&[
            QueryKey::FileVersions(id),
            QueryKey::FileActivities(id),
            QueryKey::FileComments(id),
        ]);
        info!(file_id = id, "file deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // File versions
    // -------------------------------------------------------------------------

    pub async fn list_file_versions(&self, file_id: Id) -> Result<Vec<FileVersion>, GatewayError> {
        self.require_file(file_id).await?;
        self.cached(QueryKey::FileVersions(file_id), self.store.list_file_versions(file_id))
            .await
    }

    pub async fn get_file_version(&self, id: Id) -> Result<FileVersion, GatewayError> {
        found(self.store.get_file_version(id).await?, EntityKind::FileVersion, id)
    }

    /// Record a new version of a file: the version row, the file's current
    /// pointer and a `version` activity land together.
    pub async fn record_file_version(&self, file_id: Id, draft: FileVersionDraft) -> Result<FileVersion, GatewayError> {
        let file = self.require_file(file_id).await?;
        let new = draft.validate(file_id)?;
        let mut v = Validator::default();
        self.check_user(&mut v, "createdById", new.created_by_id).await?;
        v.finish()?;
        let version = match self.store.record_file_version(new).await {
            Ok(Some(version)) => version,
            Ok(None) => return Err(GatewayError::not_found(EntityKind::File, file_id)),
            Err(StoreError::Constraint(_)) => {
                return Err(ValidationError::single("versionNumber", "already exists for this file").into());
            }
            Err(StoreError::VersionsExhausted(_)) => {
                let err = ValidationError::single("versionNumber", "cannot follow the highest existing version");
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        self.invalidate_file_lists(file.project_id, &[file.folder_id]);
        self.cache
            .invalidate(&[QueryKey::FileVersions(file_id), QueryKey::FileActivities(file_id)]);
        info!(file_id, version_id = version.id, version_number = version.version_number, "file version recorded");
        Ok(version)
    }

    pub async fn update_file_version(&self, id: Id, patch: FileVersionPatch) -> Result<FileVersion, GatewayError> {
        let version = found(self.store.update_file_version(id, patch).await?, EntityKind::FileVersion, id)?;
        self.cache.invalidate(&[QueryKey::FileVersions(version.file_id)]);
        info!(version_id = id, "file version updated");
        Ok(version)
    }

    pub async fn delete_file_version(&self, id: Id) -> Result<(), GatewayError> {
        let version = self.get_file_version(id).await?;
        if !self.store.delete_file_version(id).await? {
            return Err(GatewayError::not_found(EntityKind::FileVersion, id));
        }
        self.cache.invalidate(&[QueryKey::FileVersions(version.file_id)]);
        // The file's current-version pointer may have been cleared.
        if let Some(file) = self.store.get_file(version.file_id).await? {
            self.invalidate_file_lists(file.project_id, &[file.folder_id]);
        }
        info!(version_id = id, "file version deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // File activities
    // -------------------------------------------------------------------------

    pub async fn list_file_activities(&self, file_id: Id) -> Result<Vec<FileActivity>, GatewayError> {
        self.require_file(file_id).await?;
        self.cached(QueryKey::FileActivities(file_id), self.store.list_file_activities(file_id))
            .await
    }

    pub async fn get_file_activity(&self, id: Id) -> Result<FileActivity, GatewayError> {
        found(self.store.get_file_activity(id).await?, EntityKind::FileActivity, id)
    }

    pub async fn create_file_activity(
        &self,
        file_id: Id,
        draft: FileActivityDraft,
    ) -> Result<FileActivity, GatewayError> {
        self.require_file(file_id).await?;
        let new = draft.validate(file_id)?;
        let mut v = Validator::default();
        self.check_user(&mut v, "userId", new.user_id).await?;
        v.finish()?;
        let activity = self.store.create_file_activity(new).await?;
        self.cache.invalidate(&[QueryKey::FileActivities(file_id)]);
        info!(file_id, action = %activity.action, "file activity logged");
        Ok(activity)
    }

    pub async fn update_file_activity(&self, id: Id, patch: FileActivityPatch) -> Result<FileActivity, GatewayError> {
        let patch = patch.validate()?;
        let activity = found(self.store.update_file_activity(id, patch).await?, EntityKind::FileActivity, id)?;
        self.cache.invalidate(&[QueryKey::FileActivities(activity.file_id)]);
        Ok(activity)
    }

    pub async fn delete_file_activity(&self, id: Id) -> Result<(), GatewayError> {
        let activity = self.get_file_activity(id).await?;
        if !self.store.delete_file_activity(id).await? {
            return Err(GatewayError::not_found(EntityKind::FileActivity, id));
        }
        self.cache.invalidate(&[QueryKey::FileActivities(activity.file_id)]);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    pub async fn list_task_comments(&self, task_id: Id) -> Result<Vec<Comment>, GatewayError> {
        self.require_task(task_id).await?;
        self.cached(QueryKey::TaskComments(task_id), self.store.list_task_comments(task_id))
            .await
    }

    pub async fn list_file_comments(&self, file_id: Id) -> Result<Vec<Comment>, GatewayError> {
        self.require_file(file_id).await?;
        self.cached(QueryKey::FileComments(file_id), self.store.list_file_comments(file_id))
            .await
    }

    pub async fn get_comment(&self, id: Id) -> Result<Comment, GatewayError> {
        found(self.store.get_comment(id).await?, EntityKind::Comment, id)
    }

    pub async fn create_comment(&self, draft: CommentDraft) -> Result<Comment, GatewayError> {
        let new = draft.validate()?;
        let mut v = Validator::default();
        self.check_user(&mut v, "userId", Some(new.user_id)).await?;
        if let Some(task_id) = new.task_id {
            let exists = self.store.get_task(task_id).await?.is_some();
            v.check(exists, "taskId", "does not exist");
        }
        if let Some(file_id) = new.file_id {
            let exists = self.store.get_file(file_id).await?.is_some();
            v.check(exists, "fileId", "does not exist");
        }
        v.finish()?;
        let comment = self.store.create_comment(new).await?;
        self.invalidate_comment_scopes(&comment);
        info!(comment_id = comment.id, user_id = comment.user_id, "comment created");
        Ok(comment)
    }

    pub async fn update_comment(&self, id: Id, patch: CommentPatch) -> Result<Comment, GatewayError> {
        let patch = patch.validate()?;
        let comment = found(self.store.update_comment(id, patch).await?, EntityKind::Comment, id)?;
        self.invalidate_comment_scopes(&comment);
        Ok(comment)
    }

    pub async fn delete_comment(&self, id: Id) -> Result<(), GatewayError> {
        let comment = self.get_comment(id).await?;
        if !self.store.delete_comment(id).await? {
            return Err(GatewayError::not_found(EntityKind::Comment, id));
        }
        self.invalidate_comment_scopes(&comment);
        info!(comment_id = id, "comment deleted");
        Ok(())
    }

    fn invalidate_comment_scopes(&self, comment: &Comment) {
        let keys: Vec<QueryKey> = comment
            .task_id
            .map(QueryKey::TaskComments)
            .into_iter()
            .chain(comment.file_id.map(QueryKey::FileComments))
            .collect();
        self.cache.invalidate(&keys);
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
