//! Postgres store: runtime-checked SQLx queries over a shared pool.
//!
//! DESIGN
//! ======
//! Reads decode straight into the model structs via `FromRow`. Updates lock
//! the row (`FOR UPDATE`), apply the patch in Rust, and write every mutable
//! column back inside one transaction, so patch semantics live in one place
//! for both stores. Cascades and set-null rules are foreign-key clauses in
//! the schema, so deletes are single statements.

use sqlx::{PgPool, Postgres, Transaction};

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

const USER_COLUMNS: &str = "id, username, full_name, email, avatar, role";
const PROJECT_COLUMNS: &str = "id, name, description, start_date, end_date, status, created_at, updated_at";
const MEMBER_COLUMNS: &str = "id, project_id, user_id, role, joined_at";
const MILESTONE_COLUMNS: &str = "id, project_id, name, description, due_date, completed, created_at";
const TASK_COLUMNS: &str = "id, project_id, milestone_id, assignee_id, title, description, status, priority, \
                            due_date, estimated_hours, created_at, updated_at";
const FOLDER_COLUMNS: &str = "id, project_id, name, parent_id, path, created_at, updated_at";
const FILE_COLUMNS: &str = "id, project_id, folder_id, name, type, file_extension, path, size, metadata, \
                            current_version_id, created_at, updated_at";
const VERSION_COLUMNS: &str =
    "id, file_id, version_number, created_by_id, path, size, metadata, change_description, created_at";
const ACTIVITY_COLUMNS: &str = "id, file_id, user_id, action, details, created_at";
const COMMENT_COLUMNS: &str = "id, task_id, file_id, user_id, content, created_at, updated_at";

/// Advisory lock namespace for folder-tree moves; the second key is the project id.
const FOLDER_TREE_LOCK: i32 = 0x464f_4c44;

/// Unique and foreign-key violations become `Constraint`; everything else
/// stays a database error.
fn classify(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation() {
            return StoreError::Constraint(db.message().to_owned());
        }
    }
    StoreError::Database(err)
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        Ok(self.pool.begin().await?)
    }

    async fn delete_by_id(&self, table: &str, id: Id) -> Result<bool, StoreError> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn lock_row<T>(
    tx: &mut Transaction<'static, Postgres>,
    table: &str,
    columns: &str,
    id: Id,
) -> Result<Option<T>, StoreError>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    let row = sqlx::query_as::<_, T>(&format!("SELECT {columns} FROM {table} WHERE id = $1 FOR UPDATE"))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row)
}

#[async_trait::async_trait]
impl Store for PgStore {
    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_user(&self, id: Id) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, full_name, email, avatar, role) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new.username)
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.avatar)
        .bind(&new.role)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_user(&self, id: Id, patch: UserPatch) -> Result<Option<User>, StoreError> {
        let mut tx = self.begin().await?;
        let Some(mut user) = lock_row::<User>(&mut tx, "users", USER_COLUMNS, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut user);
        sqlx::query("UPDATE users SET username = $2, full_name = $3, email = $4, avatar = $5, role = $6 WHERE id = $1")
            .bind(id)
            .bind(&user.username)
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.avatar)
            .bind(&user.role)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        tx.commit().await?;
        Ok(Some(user))
    }

    async fn delete_user(&self, id: Id) -> Result<bool, StoreError> {
        self.delete_by_id("users", id).await
    }

    // -------------------------------------------------------------------------
    // Projects
    // -------------------------------------------------------------------------

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let rows = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_project(&self, id: Id) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query_as::<_, Project>(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_project(&self, new: NewProject) -> Result<Project, StoreError> {
        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (name, description, start_date, end_date, status) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.status)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_project(&self, id: Id, patch: ProjectPatch) -> Result<Option<Project>, StoreError> {
        let mut tx = self.begin().await?;
        let Some(mut project) = lock_row::<Project>(&mut tx, "projects", PROJECT_COLUMNS, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut project);
        let project = sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects SET name = $2, description = $3, start_date = $4, end_date = $5, status = $6, \
             updated_at = now() WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(&project.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;
        tx.commit().await?;
        Ok(Some(project))
    }

    async fn delete_project(&self, id: Id) -> Result<bool, StoreError> {
        self.delete_by_id("projects", id).await
    }

    // -------------------------------------------------------------------------
    // Members
    // -------------------------------------------------------------------------

    async fn list_members(&self, project_id: Id) -> Result<Vec<MemberWithUser>, StoreError> {
        let members = sqlx::query_as::<_, ProjectMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM project_members WHERE project_id = $1 ORDER BY id"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        let user_ids: Vec<Id> = members.iter().map(|m| m.user_id).collect();
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(&user_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(members
            .into_iter()
            .filter_map(|member| {
                let user = users.iter().find(|u| u.id == member.user_id)?.clone();
                Some(MemberWithUser { member, user })
            })
            .collect())
    }

    async fn get_member(&self, project_id: Id, user_id: Id) -> Result<Option<ProjectMember>, StoreError> {
        let row = sqlx::query_as::<_, ProjectMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM project_members WHERE project_id = $1 AND user_id = $2"
        ))
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn add_member(&self, new: NewMember) -> Result<ProjectMember, StoreError> {
        sqlx::query_as::<_, ProjectMember>(&format!(
            "INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3) RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(new.project_id)
        .bind(new.user_id)
        .bind(&new.role)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_member(
        &self,
        project_id: Id,
        user_id: Id,
        patch: MemberPatch,
    ) -> Result<Option<ProjectMember>, StoreError> {
        let Some(role) = patch.role else {
            return self.get_member(project_id, user_id).await;
        };
        let row = sqlx::query_as::<_, ProjectMember>(&format!(
            "UPDATE project_members SET role = $3 WHERE project_id = $1 AND user_id = $2 RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(project_id)
        .bind(user_id)
        .bind(&role)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn remove_member(&self, project_id: Id, user_id: Id) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Milestones
    // -------------------------------------------------------------------------

    async fn list_milestones(&self, project_id: Id) -> Result<Vec<Milestone>, StoreError> {
        let rows = sqlx::query_as::<_, Milestone>(&format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE project_id = $1 ORDER BY due_date ASC NULLS LAST, id"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_milestone(&self, id: Id) -> Result<Option<Milestone>, StoreError> {
        let row = sqlx::query_as::<_, Milestone>(&format!("SELECT {MILESTONE_COLUMNS} FROM milestones WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_milestone(&self, new: NewMilestone) -> Result<Milestone, StoreError> {
        sqlx::query_as::<_, Milestone>(&format!(
            "INSERT INTO milestones (project_id, name, description, due_date, completed) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {MILESTONE_COLUMNS}"
        ))
        .bind(new.project_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.due_date)
        .bind(new.completed)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_milestone(&self, id: Id, patch: MilestonePatch) -> Result<Option<Milestone>, StoreError> {
        let mut tx = self.begin().await?;
        let Some(mut milestone) = lock_row::<Milestone>(&mut tx, "milestones", MILESTONE_COLUMNS, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut milestone);
        sqlx::query("UPDATE milestones SET name = $2, description = $3, due_date = $4, completed = $5 WHERE id = $1")
            .bind(id)
            .bind(&milestone.name)
            .bind(&milestone.description)
            .bind(milestone.due_date)
            .bind(milestone.completed)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(milestone))
    }

    async fn delete_milestone(&self, id: Id) -> Result<bool, StoreError> {
        self.delete_by_id("milestones", id).await
    }

    // -------------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------------

    async fn list_tasks(&self, project_id: Id, milestone_id: Option<Id>) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 AND ($2::int IS NULL OR milestone_id = $2) \
             ORDER BY due_date ASC NULLS LAST, id"
        ))
        .bind(project_id)
        .bind(milestone_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_task(&self, id: Id) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (project_id, milestone_id, assignee_id, title, description, status, priority, \
             due_date, estimated_hours) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {TASK_COLUMNS}"
        ))
        .bind(new.project_id)
        .bind(new.milestone_id)
        .bind(new.assignee_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.status)
        .bind(&new.priority)
        .bind(new.due_date)
        .bind(new.estimated_hours)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_task(&self, id: Id, patch: TaskPatch) -> Result<Option<Task>, StoreError> {
        let mut tx = self.begin().await?;
        let Some(mut task) = lock_row::<Task>(&mut tx, "tasks", TASK_COLUMNS, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut task);
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET milestone_id = $2, assignee_id = $3, title = $4, description = $5, status = $6, \
             priority = $7, due_date = $8, estimated_hours = $9, updated_at = now() WHERE id = $1 \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(task.milestone_id)
        .bind(task.assignee_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(&task.priority)
        .bind(task.due_date)
        .bind(task.estimated_hours)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;
        tx.commit().await?;
        Ok(Some(task))
    }

    async fn delete_task(&self, id: Id) -> Result<bool, StoreError> {
        self.delete_by_id("tasks", id).await
    }

    // -------------------------------------------------------------------------
    // Folders
    // -------------------------------------------------------------------------

    async fn list_folders(&self, project_id: Id, parent_id: Option<Id>) -> Result<Vec<Folder>, StoreError> {
        let rows = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE project_id = $1 AND ($2::int IS NULL OR parent_id = $2) \
             ORDER BY name, id"
        ))
        .bind(project_id)
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_folder(&self, id: Id) -> Result<Option<Folder>, StoreError> {
        let row = sqlx::query_as::<_, Folder>(&format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_folder(&self, new: NewFolder) -> Result<Folder, StoreError> {
        sqlx::query_as::<_, Folder>(&format!(
            "INSERT INTO folders (project_id, name, parent_id, path) VALUES ($1, $2, $3, $4) RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(new.project_id)
        .bind(&new.name)
        .bind(new.parent_id)
        .bind(&new.path)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_folder(&self, id: Id, patch: FolderPatch) -> Result<Option<Folder>, StoreError> {
        let mut tx = self.begin().await?;
        let Some(mut folder) = lock_row::<Folder>(&mut tx, "folders", FOLDER_COLUMNS, id).await? else {
            return Ok(None);
        };
        if let Some(Some(parent_id)) = patch.parent_id {
            // Folder moves in one project hold this lock through the ancestry check.
            sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
                .bind(FOLDER_TREE_LOCK)
                .bind(folder.project_id)
                .execute(&mut *tx)
                .await?;
            let cycles: bool = sqlx::query_scalar(
                "WITH RECURSIVE ancestors(id, parent_id) AS ( \
                   SELECT id, parent_id FROM folders WHERE id = $1 \
                   UNION \
                   SELECT f.id, f.parent_id FROM folders f JOIN ancestors a ON f.id = a.parent_id \
                 ) SELECT EXISTS (SELECT 1 FROM ancestors WHERE id = $2)",
            )
            .bind(parent_id)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if cycles {
                return Err(StoreError::FolderCycle { folder_id: id, parent_id });
            }
        }
        patch.apply(&mut folder);
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "UPDATE folders SET name = $2, parent_id = $3, path = $4, updated_at = now() WHERE id = $1 \
             RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(id)
        .bind(&folder.name)
        .bind(folder.parent_id)
        .bind(&folder.path)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;
        tx.commit().await?;
        Ok(Some(folder))
    }

    async fn delete_folder(&self, id: Id) -> Result<bool, StoreError> {
        // parent_id and folder_id cascades take the subtree and its files.
        self.delete_by_id("folders", id).await
    }

    // -------------------------------------------------------------------------
    // Files
    // -------------------------------------------------------------------------

    async fn list_files(&self, project_id: Id, folder_id: Option<Id>) -> Result<Vec<File>, StoreError> {
        let rows = sqlx::query_as::<_, File>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE project_id = $1 AND ($2::int IS NULL OR folder_id = $2) \
             ORDER BY name, id"
        ))
        .bind(project_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_file(&self, id: Id) -> Result<Option<File>, StoreError> {
        let row = sqlx::query_as::<_, File>(&format!("SELECT {FILE_COLUMNS} FROM files WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_file(&self, new: NewFile) -> Result<File, StoreError> {
        sqlx::query_as::<_, File>(&format!(
            "INSERT INTO files (project_id, folder_id, name, type, file_extension, path, size, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {FILE_COLUMNS}"
        ))
        .bind(new.project_id)
        .bind(new.folder_id)
        .bind(&new.name)
        .bind(new.file_type)
        .bind(&new.file_extension)
        .bind(&new.path)
        .bind(new.size)
        .bind(&new.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_file(&self, id: Id, patch: FilePatch) -> Result<Option<File>, StoreError> {
        let mut tx = self.begin().await?;
        let Some(mut file) = lock_row::<File>(&mut tx, "files", FILE_COLUMNS, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut file);
        let file = sqlx::query_as::<_, File>(&format!(
            "UPDATE files SET folder_id = $2, name = $3, type = $4, file_extension = $5, path = $6, size = $7, \
             metadata = $8, updated_at = now() WHERE id = $1 RETURNING {FILE_COLUMNS}"
        ))
        .bind(id)
        .bind(file.folder_id)
        .bind(&file.name)
        .bind(file.file_type)
        .bind(&file.file_extension)
        .bind(&file.path)
        .bind(file.size)
        .bind(&file.metadata)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;
        tx.commit().await?;
        Ok(Some(file))
    }

    async fn delete_file(&self, id: Id) -> Result<bool, StoreError> {
        self.delete_by_id("files", id).await
    }

    // -------------------------------------------------------------------------
    // File versions
    // -------------------------------------------------------------------------

    async fn list_file_versions(&self, file_id: Id) -> Result<Vec<FileVersion>, StoreError> {
        let rows = sqlx::query_as::<_, FileVersion>(&format!(
            "SELECT {VERSION_COLUMNS} FROM file_versions WHERE file_id = $1 ORDER BY version_number DESC"
        ))
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_file_version(&self, id: Id) -> Result<Option<FileVersion>, StoreError> {
        let row =
            sqlx::query_as::<_, FileVersion>(&format!("SELECT {VERSION_COLUMNS} FROM file_versions WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn record_file_version(&self, new: NewFileVersion) -> Result<Option<FileVersion>, StoreError> {
        let mut tx = self.begin().await?;
        let Some(file) = lock_row::<File>(&mut tx, "files", FILE_COLUMNS, new.file_id).await? else {
            return Ok(None);
        };

        let version_number = match new.version_number {
            Some(number) => number,
            None => {
                let max: Option<i32> =
                    sqlx::query_scalar("SELECT MAX(version_number) FROM file_versions WHERE file_id = $1")
                        .bind(file.id)
                        .fetch_one(&mut *tx)
                        .await?;
                max.unwrap_or(0).checked_add(1).ok_or(StoreError::VersionsExhausted(file.id))?
            }
        };

        let version = sqlx::query_as::<_, FileVersion>(&format!(
            "INSERT INTO file_versions (file_id, version_number, created_by_id, path, size, metadata, \
             change_description) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {VERSION_COLUMNS}"
        ))
        .bind(file.id)
        .bind(version_number)
        .bind(new.created_by_id)
        .bind(new.path.as_deref().unwrap_or(&file.path))
        .bind(new.size.unwrap_or(file.size))
        .bind(&new.metadata)
        .bind(&new.change_description)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        sqlx::query(
            "UPDATE files SET current_version_id = $2, path = $3, size = $4, updated_at = now() WHERE id = $1",
        )
        .bind(file.id)
        .bind(version.id)
        .bind(&version.path)
        .bind(version.size)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO file_activities (file_id, user_id, action, details) VALUES ($1, $2, 'version', $3)")
            .bind(file.id)
            .bind(version.created_by_id)
            .bind(version_activity_details(&version))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(version))
    }

    async fn update_file_version(&self, id: Id, patch: FileVersionPatch) -> Result<Option<FileVersion>, StoreError> {
        let mut tx = self.begin().await?;
        let Some(mut version) = lock_row::<FileVersion>(&mut tx, "file_versions", VERSION_COLUMNS, id).await? else {
            return Ok(None);
        };
        patch.apply(&mut version);
        sqlx::query("UPDATE file_versions SET change_description = $2, metadata = $3 WHERE id = $1")
            .bind(id)
            .bind(&version.change_description)
            .bind(&version.metadata)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(version))
    }

    async fn delete_file_version(&self, id: Id) -> Result<bool, StoreError> {
        self.delete_by_id("file_versions", id).await
    }

    // -------------------------------------------------------------------------
    // File activities
    // -------------------------------------------------------------------------

    async fn list_file_activities(&self, file_id: Id) -> Result<Vec<FileActivity>, StoreError> {
        let rows = sqlx::query_as::<_, FileActivity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM file_activities WHERE file_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_file_activity(&self, id: Id) -> Result<Option<FileActivity>, StoreError> {
        let row =
            sqlx::query_as::<_, FileActivity>(&format!("SELECT {ACTIVITY_COLUMNS} FROM file_activities WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }

    async fn create_file_activity(&self, new: NewFileActivity) -> Result<FileActivity, StoreError> {
        sqlx::query_as::<_, FileActivity>(&format!(
            "INSERT INTO file_activities (file_id, user_id, action, details) VALUES ($1, $2, $3, $4) \
             RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(new.file_id)
        .bind(new.user_id)
        .bind(&new.action)
        .bind(&new.details)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_file_activity(
        &self,
        id: Id,
        patch: FileActivityPatch,
    ) -> Result<Option<FileActivity>, StoreError> {
        let mut tx = self.begin().await?;
        let Some(mut activity) = lock_row::<FileActivity>(&mut tx, "file_activities", ACTIVITY_COLUMNS, id).await?
        else {
            return Ok(None);
        };
        patch.apply(&mut activity);
        sqlx::query("UPDATE file_activities SET action = $2, details = $3 WHERE id = $1")
            .bind(id)
            .bind(&activity.action)
            .bind(&activity.details)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(activity))
    }

    async fn delete_file_activity(&self, id: Id) -> Result<bool, StoreError> {
        self.delete_by_id("file_activities", id).await
    }

    // -------------------------------------------------------------------------
    // Comments
    // -------------------------------------------------------------------------

    async fn list_task_comments(&self, task_id: Id) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE task_id = $1 ORDER BY created_at, id"
        ))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_file_comments(&self, file_id: Id) -> Result<Vec<Comment>, StoreError> {
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE file_id = $1 ORDER BY created_at, id"
        ))
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_comment(&self, id: Id) -> Result<Option<Comment>, StoreError> {
        let row = sqlx::query_as::<_, Comment>(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_comment(&self, new: NewComment) -> Result<Comment, StoreError> {
        sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comments (task_id, file_id, user_id, content) VALUES ($1, $2, $3, $4) \
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(new.task_id)
        .bind(new.file_id)
        .bind(new.user_id)
        .bind(&new.content)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_comment(&self, id: Id, patch: CommentPatch) -> Result<Option<Comment>, StoreError> {
        let Some(content) = patch.content else {
            return self.get_comment(id).await;
        };
        let row = sqlx::query_as::<_, Comment>(&format!(
            "UPDATE comments SET content = $2, updated_at = now() WHERE id = $1 RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(&content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_comment(&self, id: Id) -> Result<bool, StoreError> {
        self.delete_by_id("comments", id).await
    }
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "postgres_test.rs"]
mod tests;
