//! Entity records for the project-management domain.
//!
//! DESIGN
//! ======
//! Every record is a flat row keyed by an integer id, with owning foreign keys
//! and timestamps. The same structs are decoded from Postgres (`FromRow`) and
//! held by the in-memory store, and they serialize as the camelCase JSON the
//! dashboard consumes.
//!
//! Project is the root of the ownership tree: members, milestones, tasks,
//! folders and files all carry `project_id`; versions, activities and comments
//! hang off files and tasks.

pub mod input;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Row identifier. Matches Postgres `SERIAL`.
pub type Id = i32;

// =============================================================================
// ENUMS
// =============================================================================

/// Kanban column of a task. Stored as the `task_status` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Backlog,
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub const ALL: [Self; 5] = [Self::Backlog, Self::Todo, Self::InProgress, Self::Review, Self::Done];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

/// Asset category of a project file. Stored as the `file_type` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Model,
    Texture,
    Material,
    Animation,
    Document,
    Other,
}

// =============================================================================
// RECORDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: Id,
    pub project_id: Id,
    pub user_id: Id,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

/// Membership joined with the member's user row, as the team panel shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: ProjectMember,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: Id,
    pub project_id: Id,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Id,
    pub project_id: Id,
    pub milestone_id: Option<Id>,
    pub assignee_id: Option<Id>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: String,
    #[serde(with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub estimated_hours: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Id,
    pub project_id: Id,
    pub name: String,
    pub parent_id: Option<Id>,
    pub path: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: Id,
    pub project_id: Id,
    pub folder_id: Option<Id>,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub file_type: FileType,
    pub file_extension: String,
    pub path: String,
    /// Size in bytes.
    pub size: i64,
    pub metadata: Option<serde_json::Value>,
    pub current_version_id: Option<Id>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileVersion {
    pub id: Id,
    pub file_id: Id,
    pub version_number: i32,
    pub created_by_id: Option<Id>,
    pub path: String,
    pub size: i64,
    pub metadata: Option<serde_json::Value>,
    pub change_description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FileActivity {
    pub id: Id,
    pub file_id: Id,
    pub user_id: Option<Id>,
    /// e.g. `created`, `updated`, `renamed`, `version`.
    pub action: String,
    pub details: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Id,
    pub task_id: Option<Id>,
    pub file_id: Option<Id>,
    pub user_id: Id,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

// =============================================================================
// ENTITY KINDS
// =============================================================================

/// Names each entity kind for not-found and failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Project,
    Member,
    Milestone,
    Task,
    Folder,
    File,
    FileVersion,
    FileActivity,
    Comment,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Member => "member",
            Self::Milestone => "milestone",
            Self::Task => "task",
            Self::Folder => "folder",
            Self::File => "file",
            Self::FileVersion => "file version",
            Self::FileActivity => "file activity",
            Self::Comment => "comment",
        }
    }

    /// Capitalized label, e.g. `"File version"`.
    #[must_use]
    pub fn label(self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
