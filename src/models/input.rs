//! Request drafts, validated inserts, and partial updates.
//!
//! DESIGN
//! ======
//! Request bodies deserialize into `*Draft` types whose fields are all
//! optional, so a missing required field becomes a structured field error
//! instead of a serde rejection. `validate` turns a draft into the typed
//! `New*` value handed to the store. `*Patch` types carry partial updates;
//! nullable columns use `Option<Option<T>>` so `null` clears the value while
//! an absent key leaves it alone.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use super::{
    Comment, File, FileActivity, FileType, FileVersion, Folder, Id, Milestone, Project, ProjectMember, Task,
    TaskStatus, User,
};

// =============================================================================
// VALIDATION
// =============================================================================

/// One offending request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Structured rejection listing every offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", summarize(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self { errors: vec![FieldError { field: field.to_owned(), message: message.into() }] }
    }

    /// True if `field` is among the offending fields.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Accumulates field errors while a draft is checked.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError { field: field.to_owned(), message: message.into() });
    }

    pub fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.reject(field, "is required");
        }
        value
    }

    /// Required string that must not be blank. Returned trimmed.
    pub fn text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value {
            None => {
                self.reject(field, "is required");
                None
            }
            Some(raw) if raw.trim().is_empty() => {
                self.reject(field, "must not be blank");
                None
            }
            Some(raw) => Some(raw.trim().to_owned()),
        }
    }

    /// Optional string that, when present, must not be blank.
    pub fn optional_text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value {
            Some(raw) if raw.trim().is_empty() => {
                self.reject(field, "must not be blank");
                None
            }
            other => other.map(|raw| raw.trim().to_owned()),
        }
    }

    pub fn non_negative(&mut self, field: &str, value: Option<i64>) -> Option<i64> {
        match value {
            Some(n) if n < 0 => {
                self.reject(field, "must not be negative");
                None
            }
            other => other,
        }
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.reject(field, message);
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// # Errors
    ///
    /// Returns every recorded field error.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() { Ok(()) } else { Err(ValidationError { errors: self.errors }) }
    }

    #[must_use]
    pub fn into_error(self) -> ValidationError {
        ValidationError { errors: self.errors }
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn nullable_datetime<'de, D>(deserializer: D) -> Result<Option<Option<OffsetDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    time::serde::rfc3339::option::deserialize(deserializer).map(Some)
}

fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Extension of a file name without the dot, if it has one.
#[must_use]
pub fn extension_of(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then_some(ext)
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub role: String,
}

impl UserDraft {
    /// # Errors
    ///
    /// Returns field errors for missing names or a malformed email.
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        let mut v = Validator::default();
        let username = v.text("username", self.username);
        let full_name = v.text("fullName", self.full_name);
        let email = v.text("email", self.email);
        if let Some(email) = email.as_deref() {
            v.check(valid_email(email), "email", "must be a valid email address");
        }
        let role = v.optional_text("role", self.role);
        match (username, full_name, email) {
            (Some(username), Some(full_name), Some(email)) if v.is_ok() => Ok(NewUser {
                username,
                full_name,
                email,
                avatar: self.avatar,
                role: role.unwrap_or_else(|| "member".to_owned()),
            }),
            _ => Err(v.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar: Option<Option<String>>,
    pub role: Option<String>,
}

impl UserPatch {
    /// # Errors
    ///
    /// Returns field errors for blank names or a malformed email.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut v = Validator::default();
        let username = v.optional_text("username", self.username);
        let full_name = v.optional_text("fullName", self.full_name);
        let email = v.optional_text("email", self.email);
        if let Some(email) = email.as_deref() {
            v.check(valid_email(email), "email", "must be a valid email address");
        }
        let role = v.optional_text("role", self.role);
        v.finish()?;
        Ok(Self { username, full_name, email, avatar: self.avatar, role })
    }

    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username;
        }
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

// =============================================================================
// PROJECTS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_date: Option<OffsetDateTime>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub start_date: OffsetDateTime,
    pub end_date: Option<OffsetDateTime>,
    pub status: String,
}

impl ProjectDraft {
    /// # Errors
    ///
    /// Returns field errors for a missing name/start date or an end date
    /// before the start date.
    pub fn validate(self) -> Result<NewProject, ValidationError> {
        let mut v = Validator::default();
        let name = v.text("name", self.name);
        let start_date = v.required("startDate", self.start_date);
        if let (Some(start), Some(end)) = (start_date, self.end_date) {
            v.check(end >= start, "endDate", "must not be before startDate");
        }
        let status = v.optional_text("status", self.status);
        match (name, start_date) {
            (Some(name), Some(start_date)) if v.is_ok() => Ok(NewProject {
                name,
                description: self.description,
                start_date,
                end_date: self.end_date,
                status: status.unwrap_or_else(|| "active".to_owned()),
            }),
            _ => Err(v.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "nullable_datetime")]
    pub end_date: Option<Option<OffsetDateTime>>,
    pub status: Option<String>,
}

impl ProjectPatch {
    /// # Errors
    ///
    /// Returns field errors for blank text fields.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut v = Validator::default();
        let name = v.optional_text("name", self.name);
        let status = v.optional_text("status", self.status);
        v.finish()?;
        Ok(Self { name, status, ..self })
    }

    pub fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
    }
}

// =============================================================================
// MEMBERS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDraft {
    pub user_id: Option<Id>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub project_id: Id,
    pub user_id: Id,
    pub role: String,
}

impl MemberDraft {
    /// # Errors
    ///
    /// Returns a field error when `userId` is missing.
    pub fn validate(self, project_id: Id) -> Result<NewMember, ValidationError> {
        let mut v = Validator::default();
        let user_id = v.required("userId", self.user_id);
        let role = v.optional_text("role", self.role);
        match user_id {
            Some(user_id) if v.is_ok() => {
                Ok(NewMember { project_id, user_id, role: role.unwrap_or_else(|| "member".to_owned()) })
            }
            _ => Err(v.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPatch {
    pub role: Option<String>,
}

impl MemberPatch {
    /// # Errors
    ///
    /// Returns a field error for a blank role.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut v = Validator::default();
        let role = v.optional_text("role", self.role);
        v.finish()?;
        Ok(Self { role })
    }

    pub fn apply(self, member: &mut ProjectMember) {
        if let Some(role) = self.role {
            member.role = role;
        }
    }
}

// =============================================================================
// MILESTONES
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMilestone {
    pub project_id: Id,
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<OffsetDateTime>,
    pub completed: bool,
}

impl MilestoneDraft {
    /// # Errors
    ///
    /// Returns a field error when `name` is missing or blank.
    pub fn validate(self, project_id: Id) -> Result<NewMilestone, ValidationError> {
        let mut v = Validator::default();
        let name = v.text("name", self.name);
        match name {
            Some(name) if v.is_ok() => Ok(NewMilestone {
                project_id,
                name,
                description: self.description,
                due_date: self.due_date,
                completed: self.completed.unwrap_or(false),
            }),
            _ => Err(v.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestonePatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_datetime")]
    pub due_date: Option<Option<OffsetDateTime>>,
    pub completed: Option<bool>,
}

impl MilestonePatch {
    /// # Errors
    ///
    /// Returns a field error for a blank name.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut v = Validator::default();
        let name = v.optional_text("name", self.name);
        v.finish()?;
        Ok(Self { name, ..self })
    }

    pub fn apply(self, milestone: &mut Milestone) {
        if let Some(name) = self.name {
            milestone.name = name;
        }
        if let Some(description) = self.description {
            milestone.description = description;
        }
        if let Some(due_date) = self.due_date {
            milestone.due_date = due_date;
        }
        if let Some(completed) = self.completed {
            milestone.completed = completed;
        }
    }
}

// =============================================================================
// TASKS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub milestone_id: Option<Id>,
    pub assignee_id: Option<Id>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub due_date: Option<OffsetDateTime>,
    pub estimated_hours: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub project_id: Id,
    pub milestone_id: Option<Id>,
    pub assignee_id: Option<Id>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: String,
    pub due_date: Option<OffsetDateTime>,
    pub estimated_hours: Option<i32>,
}

impl TaskDraft {
    /// # Errors
    ///
    /// Returns field errors for a missing title or negative estimate.
    pub fn validate(self, project_id: Id) -> Result<NewTask, ValidationError> {
        let mut v = Validator::default();
        let title = v.text("title", self.title);
        let priority = v.optional_text("priority", self.priority);
        v.non_negative("estimatedHours", self.estimated_hours.map(i64::from));
        match title {
            Some(title) if v.is_ok() => Ok(NewTask {
                project_id,
                milestone_id: self.milestone_id,
                assignee_id: self.assignee_id,
                title,
                description: self.description,
                status: self.status.unwrap_or_default(),
                priority: priority.unwrap_or_else(|| "medium".to_owned()),
                due_date: self.due_date,
                estimated_hours: self.estimated_hours,
            }),
            _ => Err(v.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub milestone_id: Option<Option<Id>>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee_id: Option<Option<Id>>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "nullable_datetime")]
    pub due_date: Option<Option<OffsetDateTime>>,
    #[serde(default, deserialize_with = "nullable")]
    pub estimated_hours: Option<Option<i32>>,
}

impl TaskPatch {
    /// # Errors
    ///
    /// Returns field errors for blank text or a negative estimate.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut v = Validator::default();
        let title = v.optional_text("title", self.title);
        let priority = v.optional_text("priority", self.priority);
        v.non_negative("estimatedHours", self.estimated_hours.flatten().map(i64::from));
        v.finish()?;
        Ok(Self { title, priority, ..self })
    }

    pub fn apply(self, task: &mut Task) {
        if let Some(milestone_id) = self.milestone_id {
            task.milestone_id = milestone_id;
        }
        if let Some(assignee_id) = self.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(estimated_hours) = self.estimated_hours {
            task.estimated_hours = estimated_hours;
        }
    }
}

// =============================================================================
// FOLDERS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDraft {
    pub name: Option<String>,
    pub parent_id: Option<Id>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFolder {
    pub project_id: Id,
    pub name: String,
    pub parent_id: Option<Id>,
    pub path: String,
}

impl FolderDraft {
    /// # Errors
    ///
    /// Returns field errors for a missing name or path.
    pub fn validate(self, project_id: Id) -> Result<NewFolder, ValidationError> {
        let mut v = Validator::default();
        let name = v.text("name", self.name);
        let path = v.text("path", self.path);
        match (name, path) {
            (Some(name), Some(path)) if v.is_ok() => {
                Ok(NewFolder { project_id, name, parent_id: self.parent_id, path })
            }
            _ => Err(v.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<Id>>,
    pub path: Option<String>,
}

impl FolderPatch {
    /// # Errors
    ///
    /// Returns field errors for a blank name or path.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut v = Validator::default();
        let name = v.optional_text("name", self.name);
        let path = v.optional_text("path", self.path);
        v.finish()?;
        Ok(Self { name, parent_id: self.parent_id, path })
    }

    pub fn apply(self, folder: &mut Folder) {
        if let Some(name) = self.name {
            folder.name = name;
        }
        if let Some(parent_id) = self.parent_id {
            folder.parent_id = parent_id;
        }
        if let Some(path) = self.path {
            folder.path = path;
        }
    }
}

// =============================================================================
// FILES
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDraft {
    pub folder_id: Option<Id>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub file_type: Option<FileType>,
    pub file_extension: Option<String>,
    pub path: Option<String>,
    pub size: Option<i64>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFile {
    pub project_id: Id,
    pub folder_id: Option<Id>,
    pub name: String,
    pub file_type: FileType,
    pub file_extension: String,
    pub path: String,
    pub size: i64,
    pub metadata: Option<serde_json::Value>,
}

impl FileDraft {
    /// `fileExtension` defaults to the extension of `name`.
    ///
    /// # Errors
    ///
    /// Returns field errors for missing name/type/path/size, a negative size,
    /// or no derivable extension.
    pub fn validate(self, project_id: Id) -> Result<NewFile, ValidationError> {
        let mut v = Validator::default();
        let name = v.text("name", self.name);
        let file_type = v.required("type", self.file_type);
        let path = v.text("path", self.path);
        let size = v.required("size", self.size);
        let size = v.non_negative("size", size);
        let file_extension = match v.optional_text("fileExtension", self.file_extension) {
            Some(ext) => Some(ext.trim_start_matches('.').to_owned()),
            None => match name.as_deref() {
                Some(name) => {
                    let ext = extension_of(name).map(str::to_owned);
                    if ext.is_none() {
                        v.reject("fileExtension", "is required when name has no extension");
                    }
                    ext
                }
                None => None,
            },
        };
        match (name, file_type, path, size, file_extension) {
            (Some(name), Some(file_type), Some(path), Some(size), Some(file_extension)) if v.is_ok() => Ok(NewFile {
                project_id,
                folder_id: self.folder_id,
                name,
                file_type,
                file_extension,
                path,
                size,
                metadata: self.metadata,
            }),
            _ => Err(v.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePatch {
    #[serde(default, deserialize_with = "nullable")]
    pub folder_id: Option<Option<Id>>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub file_type: Option<FileType>,
    pub file_extension: Option<String>,
    pub path: Option<String>,
    pub size: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub metadata: Option<Option<serde_json::Value>>,
}

impl FilePatch {
    /// # Errors
    ///
    /// Returns field errors for blank text or a negative size.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut v = Validator::default();
        let name = v.optional_text("name", self.name);
        let file_extension = v
            .optional_text("fileExtension", self.file_extension)
            .map(|ext| ext.trim_start_matches('.').to_owned());
        let path = v.optional_text("path", self.path);
        let size = v.non_negative("size", self.size);
        v.finish()?;
        Ok(Self { name, file_extension, path, size, ..self })
    }

    pub fn apply(self, file: &mut File) {
        if let Some(folder_id) = self.folder_id {
            file.folder_id = folder_id;
        }
        if let Some(name) = self.name {
            file.name = name;
        }
        if let Some(file_type) = self.file_type {
            file.file_type = file_type;
        }
        if let Some(file_extension) = self.file_extension {
            file.file_extension = file_extension;
        }
        if let Some(path) = self.path {
            file.path = path;
        }
        if let Some(size) = self.size {
            file.size = size;
        }
        if let Some(metadata) = self.metadata {
            file.metadata = metadata;
        }
    }
}

// =============================================================================
// FILE VERSIONS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileVersionDraft {
    pub version_number: Option<i32>,
    pub created_by_id: Option<Id>,
    pub path: Option<String>,
    pub size: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub change_description: Option<String>,
}

/// A version to record. Missing number/path/size are resolved by the store
/// from the file's current state.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFileVersion {
    pub file_id: Id,
    pub version_number: Option<i32>,
    pub created_by_id: Option<Id>,
    pub path: Option<String>,
    pub size: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub change_description: Option<String>,
}

impl FileVersionDraft {
    /// # Errors
    ///
    /// Returns field errors for a non-positive version number, blank path,
    /// or negative size.
    pub fn validate(self, file_id: Id) -> Result<NewFileVersion, ValidationError> {
        let mut v = Validator::default();
        if let Some(number) = self.version_number {
            v.check(number > 0, "versionNumber", "must be positive");
        }
        let path = v.optional_text("path", self.path);
        let size = v.non_negative("size", self.size);
        v.finish()?;
        Ok(NewFileVersion {
            file_id,
            version_number: self.version_number,
            created_by_id: self.created_by_id,
            path,
            size,
            metadata: self.metadata,
            change_description: self.change_description,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileVersionPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub change_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub metadata: Option<Option<serde_json::Value>>,
}

impl FileVersionPatch {
    pub fn apply(self, version: &mut FileVersion) {
        if let Some(change_description) = self.change_description {
            version.change_description = change_description;
        }
        if let Some(metadata) = self.metadata {
            version.metadata = metadata;
        }
    }
}

// =============================================================================
// FILE ACTIVITIES
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileActivityDraft {
    pub user_id: Option<Id>,
    pub action: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFileActivity {
    pub file_id: Id,
    pub user_id: Option<Id>,
    pub action: String,
    pub details: Option<serde_json::Value>,
}

impl FileActivityDraft {
    /// # Errors
    ///
    /// Returns a field error when `action` is missing or blank.
    pub fn validate(self, file_id: Id) -> Result<NewFileActivity, ValidationError> {
        let mut v = Validator::default();
        let action = v.text("action", self.action);
        match action {
            Some(action) if v.is_ok() => {
                Ok(NewFileActivity { file_id, user_id: self.user_id, action, details: self.details })
            }
            _ => Err(v.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileActivityPatch {
    pub action: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub details: Option<Option<serde_json::Value>>,
}

impl FileActivityPatch {
    /// # Errors
    ///
    /// Returns a field error for a blank action.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut v = Validator::default();
        let action = v.optional_text("action", self.action);
        v.finish()?;
        Ok(Self { action, details: self.details })
    }

    pub fn apply(self, activity: &mut FileActivity) {
        if let Some(action) = self.action {
            activity.action = action;
        }
        if let Some(details) = self.details {
            activity.details = details;
        }
    }
}

// =============================================================================
// COMMENTS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub task_id: Option<Id>,
    pub file_id: Option<Id>,
    pub user_id: Option<Id>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub task_id: Option<Id>,
    pub file_id: Option<Id>,
    pub user_id: Id,
    pub content: String,
}

impl CommentDraft {
    /// # Errors
    ///
    /// Returns field errors for a missing author/content or no target.
    pub fn validate(self) -> Result<NewComment, ValidationError> {
        let mut v = Validator::default();
        let user_id = v.required("userId", self.user_id);
        let content = v.text("content", self.content);
        v.check(
            self.task_id.is_some() || self.file_id.is_some(),
            "taskId",
            "either taskId or fileId is required",
        );
        match (user_id, content) {
            (Some(user_id), Some(content)) if v.is_ok() => {
                Ok(NewComment { task_id: self.task_id, file_id: self.file_id, user_id, content })
            }
            _ => Err(v.into_error()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPatch {
    pub content: Option<String>,
}

impl CommentPatch {
    /// # Errors
    ///
    /// Returns a field error for blank content.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let mut v = Validator::default();
        let content = v.optional_text("content", self.content);
        v.finish()?;
        Ok(Self { content })
    }

    pub fn apply(self, comment: &mut Comment) {
        if let Some(content) = self.content {
            comment.content = content;
        }
    }
}

#[cfg(test)]
#[path = "input_test.rs"]
mod tests;
