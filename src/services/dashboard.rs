//! Dashboard renderer: unlocked panels projected into JSON views.
//!
//! DESIGN
//! ======
//! Panel selection is a pure function of `UiState` and the optional active
//! tab. Data-backed panels (project setup, team, files, versions, analytics)
//! then read through the CRUD gateway, so they share its list cache.
//!
//! When no project is named the most recently created one is shown; when no
//! file is named the version panel shows the project's first file.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::chat::{Panel, UiState};
use crate::gateway::{CrudGateway, GatewayError};
use crate::models::{File, FileVersion, Folder, Id, MemberWithUser, Milestone, Project, Task, TaskStatus};

pub const DEFAULT_TITLE: &str = "Project Dashboard";
pub const PLACEHOLDER_MESSAGE: &str = "Project details will appear here as you chat";
pub const PLACEHOLDER_HINT: &str = "Try discussing project timeline, team members, or tools";

// =============================================================================
// TABS
// =============================================================================

/// The dashboard tab a client has selected. Independent of the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tab {
    Project,
    Team,
    Tools,
    Files,
    Versions,
    Graphs,
    ImportExport,
}

impl Tab {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Project => "Project Dashboard",
            Self::Team => "Team Management",
            Self::Tools => "Tools Comparison",
            Self::Files => "File Management",
            Self::Versions => "Version Control",
            Self::Graphs => "Project Analytics",
            Self::ImportExport => "Import & Export",
        }
    }

    #[must_use]
    pub fn panel(self) -> Panel {
        match self {
            Self::Project => Panel::ProjectSetup,
            Self::Team => Panel::TeamSetup,
            Self::Tools => Panel::ToolsComparison,
            Self::Files => Panel::FileManagement,
            Self::Versions => Panel::VersionControl,
            Self::Graphs => Panel::ProgressGraphs,
            Self::ImportExport => Panel::ImportExport,
        }
    }
}

/// Panels to render: every unlocked panel, or only the tab's panel when a
/// tab is active and that panel is unlocked.
#[must_use]
pub fn select_panels(ui: &UiState, tab: Option<Tab>) -> Vec<Panel> {
    match tab {
        None => ui.unlocked(),
        Some(tab) if ui.is_unlocked(tab.panel()) => vec![tab.panel()],
        Some(_) => Vec::new(),
    }
}

// =============================================================================
// VIEWS
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub tab: Option<Tab>,
    pub project_id: Option<Id>,
    pub file_id: Option<Id>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub title: &'static str,
    pub panels: Vec<PanelView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<Placeholder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub message: &'static str,
    pub hint: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MilestoneState {
    Completed,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneView {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub state: MilestoneState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRow {
    pub name: &'static str,
    pub price: &'static str,
    pub best_for: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFormat {
    pub extension: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "panel", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PanelView {
    ProjectSetup { project: Option<Project>, milestones: Vec<MilestoneView> },
    TeamSetup { members: Vec<MemberWithUser> },
    ToolsComparison { tools: &'static [ToolRow] },
    FileManagement { folders: Vec<Folder>, files: Vec<File> },
    VersionControl { file: Option<File>, versions: Vec<FileVersion> },
    ProgressGraphs { analytics: Option<Analytics> },
    ImportExport {
        import_formats: &'static [&'static str],
        export_formats: &'static [ExportFormat],
        export_url: Option<String>,
    },
}

impl PanelView {
    #[must_use]
    pub fn panel(&self) -> Panel {
        match self {
            Self::ProjectSetup { .. } => Panel::ProjectSetup,
            Self::TeamSetup { .. } => Panel::TeamSetup,
            Self::ToolsComparison { .. } => Panel::ToolsComparison,
            Self::FileManagement { .. } => Panel::FileManagement,
            Self::VersionControl { .. } => Panel::VersionControl,
            Self::ProgressGraphs { .. } => Panel::ProgressGraphs,
            Self::ImportExport { .. } => Panel::ImportExport,
        }
    }
}

pub const TOOLS: &[ToolRow] = &[
    ToolRow { name: "Blender", price: "Free", best_for: "All-in-one solution" },
    ToolRow { name: "Maya", price: "$1,785/year", best_for: "Industry standard" },
    ToolRow { name: "ZBrush", price: "$895", best_for: "Sculpting focused" },
];

pub const IMPORT_FORMATS: &[&str] = &[".FBX", ".OBJ", ".BLEND", ".STL"];

pub const EXPORT_FORMATS: &[ExportFormat] = &[
    ExportFormat { extension: ".FBX", description: "Autodesk exchange format" },
    ExportFormat { extension: ".OBJ", description: "Wavefront geometry" },
    ExportFormat { extension: ".STL", description: "3D printing" },
    ExportFormat { extension: ".GLTF", description: "Web and real-time engines" },
];

// =============================================================================
// ANALYTICS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: usize,
}

/// Estimated hours grouped by milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub label: String,
    pub hours: i64,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub completion_percent: u32,
    pub total_tasks: usize,
    pub done_tasks: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub started: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    /// Negative once the deadline has passed.
    pub days_remaining: Option<i64>,
    pub milestones_completed: usize,
    pub milestones_total: usize,
    pub status_counts: Vec<StatusCount>,
    pub allocation: Vec<Allocation>,
}

const UNASSIGNED: &str = "Unassigned";

fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    u32::try_from(part.saturating_mul(100) / whole).unwrap_or(100)
}

/// Project progress as of `today`.
#[must_use]
pub fn compute_analytics(
    project: &Project,
    milestones: &[Milestone],
    tasks: &[Task],
    today: OffsetDateTime,
) -> Analytics {
    let done_tasks = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
    let status_counts = TaskStatus::ALL
        .into_iter()
        .map(|status| StatusCount { status, count: tasks.iter().filter(|t| t.status == status).count() })
        .collect();

    let hours_for = |milestone_id: Option<Id>| -> i64 {
        tasks
            .iter()
            .filter(|t| t.milestone_id == milestone_id)
            .filter_map(|t| t.estimated_hours)
            .map(|h| i64::from(h.max(0)))
            .sum()
    };
    let mut groups: Vec<(String, i64)> = milestones.iter().map(|m| (m.name.clone(), hours_for(Some(m.id)))).collect();
    groups.push((UNASSIGNED.to_owned(), hours_for(None)));
    groups.retain(|(_, hours)| *hours > 0);
    let total_hours: i64 = groups.iter().map(|(_, hours)| hours).sum();
    let allocation = groups
        .into_iter()
        .map(|(label, hours)| Allocation {
            label,
            hours,
            percent: percent(hours.unsigned_abs(), total_hours.unsigned_abs()),
        })
        .collect();

    Analytics {
        completion_percent: percent(done_tasks as u64, tasks.len() as u64),
        total_tasks: tasks.len(),
        done_tasks,
        started: project.start_date,
        deadline: project.end_date,
        days_remaining: project.end_date.map(|end| (end - today).whole_days()),
        milestones_completed: milestones.iter().filter(|m| m.completed).count(),
        milestones_total: milestones.len(),
        status_counts,
        allocation,
    }
}

/// Tag each milestone in list order. The first open milestone is current.
#[must_use]
pub fn milestone_views(milestones: Vec<Milestone>) -> Vec<MilestoneView> {
    let mut seen_open = false;
    milestones
        .into_iter()
        .map(|milestone| {
            let state = if milestone.completed {
                MilestoneState::Completed
            } else if seen_open {
                MilestoneState::Upcoming
            } else {
                seen_open = true;
                MilestoneState::Current
            };
            MilestoneView { milestone, state }
        })
        .collect()
}

// =============================================================================
// RENDER
// =============================================================================

async fn resolve_project(gateway: &CrudGateway, project_id: Option<Id>) -> Result<Option<Project>, GatewayError> {
    match project_id {
        Some(id) => gateway.get_project(id).await.map(Some),
        None => Ok(gateway.list_projects().await?.into_iter().next()),
    }
}

async fn resolve_file(
    gateway: &CrudGateway,
    project: Option<&Project>,
    file_id: Option<Id>,
) -> Result<Option<File>, GatewayError> {
    match (file_id, project) {
        (Some(id), _) => gateway.get_file(id).await.map(Some),
        (None, Some(project)) => Ok(gateway.list_files(project.id, None).await?.into_iter().next()),
        (None, None) => Ok(None),
    }
}

async fn render_panel(
    gateway: &CrudGateway,
    panel: Panel,
    project: Option<&Project>,
    file_id: Option<Id>,
) -> Result<PanelView, GatewayError> {
    let view = match panel {
        Panel::ProjectSetup => {
            let milestones = match project {
                Some(p) => gateway.list_milestones(p.id).await?,
                None => Vec::new(),
            };
            PanelView::ProjectSetup { project: project.cloned(), milestones: milestone_views(milestones) }
        }
        Panel::TeamSetup => {
            let members = match project {
                Some(p) => gateway.list_members(p.id).await?,
                None => Vec::new(),
            };
            PanelView::TeamSetup { members }
        }
        Panel::ToolsComparison => PanelView::ToolsComparison { tools: TOOLS },
        Panel::FileManagement => match project {
            Some(p) => PanelView::FileManagement {
                folders: gateway.list_folders(p.id, None).await?,
                files: gateway.list_files(p.id, None).await?,
            },
            None => PanelView::FileManagement { folders: Vec::new(), files: Vec::new() },
        },
        Panel::VersionControl => {
            let file = resolve_file(gateway, project, file_id).await?;
            let versions = match &file {
                Some(f) => gateway.list_file_versions(f.id).await?,
                None => Vec::new(),
            };
            PanelView::VersionControl { file, versions }
        }
        Panel::ProgressGraphs => {
            let analytics = match project {
                Some(p) => {
                    let milestones = gateway.list_milestones(p.id).await?;
                    let tasks = gateway.list_tasks(p.id, None).await?;
                    Some(compute_analytics(p, &milestones, &tasks, OffsetDateTime::now_utc()))
                }
                None => None,
            };
            PanelView::ProgressGraphs { analytics }
        }
        Panel::ImportExport => PanelView::ImportExport {
            import_formats: IMPORT_FORMATS,
            export_formats: EXPORT_FORMATS,
            export_url: project.map(|p| format!("/api/projects/{}/export.jsonl", p.id)),
        },
    };
    Ok(view)
}

/// Render the dashboard for `ui`.
///
/// # Errors
///
/// `NotFound` if `projectId` or `fileId` names a missing row; any store
/// failure while reading panel data.
pub async fn build_dashboard(
    gateway: &CrudGateway,
    ui: &UiState,
    query: &DashboardQuery,
) -> Result<DashboardView, GatewayError> {
    let title = query.tab.map_or(DEFAULT_TITLE, Tab::title);
    let selected = select_panels(ui, query.tab);
    if selected.is_empty() {
        return Ok(DashboardView {
            title,
            panels: Vec::new(),
            placeholder: Some(Placeholder { message: PLACEHOLDER_MESSAGE, hint: PLACEHOLDER_HINT }),
        });
    }

    let needs_project = selected.iter().any(|p| *p != Panel::ToolsComparison);
    let project = if needs_project { resolve_project(gateway, query.project_id).await? } else { None };

    let mut panels = Vec::with_capacity(selected.len());
    for panel in selected {
        panels.push(render_panel(gateway, panel, project.as_ref(), query.file_id).await?);
    }
    Ok(DashboardView { title, panels, placeholder: None })
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
