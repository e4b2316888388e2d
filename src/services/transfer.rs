//! Project export/import as JSONL.
//!
//! DESIGN
//! ======
//! Export writes one `project_export_meta` line, then milestones, tasks,
//! folders (parents before children) and files, each a record tagged with
//! `kind`. Import replays those lines into a target project through the
//! gateway, so every row is validated exactly as an API create would be.
//! Exported ids are remapped to the new ids as rows are created; a reference
//! to an id that was never imported is dropped to null.
//!
//! Import is not atomic. Lines that fail to parse or validate are counted as
//! skipped and the rest still land.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::gateway::{CrudGateway, GatewayError};
use crate::models::input::{FileDraft, FolderDraft, MilestoneDraft, TaskDraft};
use crate::models::{File, Folder, Id, Milestone, Task};

pub const META_KIND: &str = "project_export_meta";
pub const EXPORT_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("failed to encode export line: {0}")]
    Encode(#[from] serde_json::Error),
}

// =============================================================================
// EXPORT
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaLine<'a> {
    kind: &'static str,
    version: u8,
    project_id: Id,
    project_name: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    exported_at: OffsetDateTime,
    record_count: usize,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RecordLine<'a> {
    Milestone(&'a Milestone),
    Task(&'a Task),
    Folder(&'a Folder),
    File(&'a File),
}

/// Order folders so every parent precedes its children.
#[must_use]
pub fn parents_first(folders: Vec<Folder>) -> Vec<Folder> {
    let mut ordered = Vec::with_capacity(folders.len());
    let mut placed: HashSet<Id> = HashSet::new();
    let mut pending = folders;
    loop {
        let (ready, rest): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(|f| f.parent_id.is_none_or(|p| placed.contains(&p)));
        if ready.is_empty() {
            // Parents outside the export; keep what is left in list order.
            ordered.extend(rest);
            return ordered;
        }
        placed.extend(ready.iter().map(|f| f.id));
        ordered.extend(ready);
        pending = rest;
        if pending.is_empty() {
            return ordered;
        }
    }
}

/// Serialize a project as newline-terminated JSONL lines.
///
/// # Errors
///
/// `NotFound` if the project is missing; store or encoding failures.
pub async fn export_lines(gateway: &CrudGateway, project_id: Id) -> Result<Vec<String>, TransferError> {
    let project = gateway.get_project(project_id).await?;
    let milestones = gateway.list_milestones(project_id).await?;
    let tasks = gateway.list_tasks(project_id, None).await?;
    let folders = parents_first(gateway.list_folders(project_id, None).await?);
    let files = gateway.list_files(project_id, None).await?;

    let records: Vec<RecordLine<'_>> = milestones
        .iter()
        .map(RecordLine::Milestone)
        .chain(tasks.iter().map(RecordLine::Task))
        .chain(folders.iter().map(RecordLine::Folder))
        .chain(files.iter().map(RecordLine::File))
        .collect();

    let meta = MetaLine {
        kind: META_KIND,
        version: EXPORT_VERSION,
        project_id,
        project_name: &project.name,
        exported_at: OffsetDateTime::now_utc(),
        record_count: records.len(),
    };

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(format!("{}\n", serde_json::to_string(&meta)?));
    for record in &records {
        lines.push(format!("{}\n", serde_json::to_string(record)?));
    }
    info!(project_id, records = records.len(), "project exported");
    Ok(lines)
}

// =============================================================================
// IMPORT
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// One importable record with the id it carried in the export.
#[derive(Debug, Clone)]
pub enum ImportLine {
    Milestone { old_id: Option<Id>, draft: MilestoneDraft },
    Task { old_id: Option<Id>, draft: TaskDraft },
    Folder { old_id: Option<Id>, draft: FolderDraft },
    File { old_id: Option<Id>, draft: FileDraft },
}

/// Parse one line. Meta and unknown kinds are `Ok(None)`.
///
/// # Errors
///
/// Returns the JSON error for a malformed line or record.
pub fn parse_import_line(line: &str) -> Result<Option<ImportLine>, serde_json::Error> {
    let value = serde_json::from_str::<Value>(line)?;
    let Some(map) = value.as_object() else {
        return Ok(None);
    };
    let old_id = map.get("id").and_then(Value::as_i64).and_then(|id| Id::try_from(id).ok());
    let kind = map.get("kind").and_then(Value::as_str).map(str::to_owned);

    let parsed = match kind.as_deref() {
        Some("milestone") => ImportLine::Milestone { old_id, draft: serde_json::from_value(value)? },
        Some("task") => ImportLine::Task { old_id, draft: serde_json::from_value(value)? },
        Some("folder") => ImportLine::Folder { old_id, draft: serde_json::from_value(value)? },
        Some("file") => ImportLine::File { old_id, draft: serde_json::from_value(value)? },
        _ => return Ok(None),
    };
    Ok(Some(parsed))
}

#[derive(Default)]
struct IdMap {
    milestones: HashMap<Id, Id>,
    folders: HashMap<Id, Id>,
}

fn remap(map: &HashMap<Id, Id>, old: Option<Id>) -> Option<Id> {
    old.and_then(|id| map.get(&id).copied())
}

fn record(map: &mut HashMap<Id, Id>, old: Option<Id>, new: Id) {
    if let Some(old) = old {
        map.insert(old, new);
    }
}

/// Replay exported lines into `project_id`.
///
/// # Errors
///
/// `NotFound` if the target project is missing, or the first store failure.
/// Validation failures only count as skipped.
pub async fn import_lines(gateway: &CrudGateway, project_id: Id, jsonl: &str) -> Result<ImportSummary, GatewayError> {
    gateway.get_project(project_id).await?;

    let mut summary = ImportSummary::default();
    let mut ids = IdMap::default();

    for raw_line in jsonl.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = match parse_import_line(line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) | Err(_) => {
                summary.skipped = summary.skipped.saturating_add(1);
                continue;
            }
        };
        match apply_line(gateway, project_id, &mut ids, parsed).await {
            Ok(()) => summary.imported = summary.imported.saturating_add(1),
            Err(GatewayError::Validation(err)) => {
                debug!(project_id, %err, "import line rejected");
                summary.skipped = summary.skipped.saturating_add(1);
            }
            Err(err) => return Err(err),
        }
    }

    info!(project_id, imported = summary.imported, skipped = summary.skipped, "project import finished");
    Ok(summary)
}

async fn apply_line(
    gateway: &CrudGateway,
    project_id: Id,
    ids: &mut IdMap,
    line: ImportLine,
) -> Result<(), GatewayError> {
    match line {
        ImportLine::Milestone { old_id, draft } => {
            let created = gateway.create_milestone(project_id, draft).await?;
            record(&mut ids.milestones, old_id, created.id);
        }
        ImportLine::Task { old_id: _, mut draft } => {
            draft.milestone_id = remap(&ids.milestones, draft.milestone_id);
            if let Some(user_id) = draft.assignee_id {
                if matches!(gateway.get_user(user_id).await, Err(GatewayError::NotFound { .. })) {
                    draft.assignee_id = None;
                }
            }
            gateway.create_task(project_id, draft).await?;
        }
        ImportLine::Folder { old_id, mut draft } => {
            draft.parent_id = remap(&ids.folders, draft.parent_id);
            let created = gateway.create_folder(project_id, draft).await?;
            record(&mut ids.folders, old_id, created.id);
        }
        ImportLine::File { old_id: _, mut draft } => {
            draft.folder_id = remap(&ids.folders, draft.folder_id);
            gateway.create_file(project_id, draft).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "transfer_test.rs"]
mod tests;
