//! Chat-driven panel unlocking.
//!
//! ARCHITECTURE
//! ============
//! A [`responses::ResponseTable`] is an ordered list of regex rules. The
//! [`matcher`] picks the first rule whose triggers match the input, and a
//! [`session::ConversationSession`] records the exchange and unlocks the
//! dashboard panels named by the rule's signal. Nothing here touches the
//! store; the dashboard reads `UiState` separately.

pub mod matcher;
pub mod responses;
pub mod session;

use serde::{Deserialize, Serialize};

// =============================================================================
// PANELS
// =============================================================================

/// Dashboard panel a reply can unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Panel {
    ProjectSetup,
    TeamSetup,
    ToolsComparison,
    FileManagement,
    VersionControl,
    ProgressGraphs,
    ImportExport,
}

impl Panel {
    pub const ALL: [Self; 7] = [
        Self::ProjectSetup,
        Self::TeamSetup,
        Self::ToolsComparison,
        Self::FileManagement,
        Self::VersionControl,
        Self::ProgressGraphs,
        Self::ImportExport,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProjectSetup => "projectSetup",
            Self::TeamSetup => "teamSetup",
            Self::ToolsComparison => "toolsComparison",
            Self::FileManagement => "fileManagement",
            Self::VersionControl => "versionControl",
            Self::ProgressGraphs => "progressGraphs",
            Self::ImportExport => "importExport",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    /// Flags a signal sets. Every panel beyond the project setup also
    /// reveals the project setup it hangs off.
    #[must_use]
    pub fn unlocks(self) -> &'static [Self] {
        match self {
            Self::ProjectSetup => &[Self::ProjectSetup],
            Self::TeamSetup => &[Self::ProjectSetup, Self::TeamSetup],
            Self::ToolsComparison => &[Self::ProjectSetup, Self::ToolsComparison],
            Self::FileManagement => &[Self::ProjectSetup, Self::FileManagement],
            Self::VersionControl => &[Self::ProjectSetup, Self::VersionControl],
            Self::ProgressGraphs => &[Self::ProjectSetup, Self::ProgressGraphs],
            Self::ImportExport => &[Self::ProjectSetup, Self::ImportExport],
        }
    }
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// UI STATE
// =============================================================================

/// Which panels are unlocked. Flags only ever go from false to true.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct UiState {
    pub project_setup: bool,
    pub team_setup: bool,
    pub tools_comparison: bool,
    pub file_management: bool,
    pub version_control: bool,
    pub progress_graphs: bool,
    pub import_export: bool,
}

impl UiState {
    #[must_use]
    pub fn is_unlocked(&self, panel: Panel) -> bool {
        match panel {
            Panel::ProjectSetup => self.project_setup,
            Panel::TeamSetup => self.team_setup,
            Panel::ToolsComparison => self.tools_comparison,
            Panel::FileManagement => self.file_management,
            Panel::VersionControl => self.version_control,
            Panel::ProgressGraphs => self.progress_graphs,
            Panel::ImportExport => self.import_export,
        }
    }

    fn flag_mut(&mut self, panel: Panel) -> &mut bool {
        match panel {
            Panel::ProjectSetup => &mut self.project_setup,
            Panel::TeamSetup => &mut self.team_setup,
            Panel::ToolsComparison => &mut self.tools_comparison,
            Panel::FileManagement => &mut self.file_management,
            Panel::VersionControl => &mut self.version_control,
            Panel::ProgressGraphs => &mut self.progress_graphs,
            Panel::ImportExport => &mut self.import_export,
        }
    }

    /// Apply a signal. Idempotent.
    pub fn unlock(&mut self, signal: Panel) {
        for &panel in signal.unlocks() {
            *self.flag_mut(panel) = true;
        }
    }

    /// Unlocked panels in display order.
    #[must_use]
    pub fn unlocked(&self) -> Vec<Panel> {
        Panel::ALL.into_iter().filter(|p| self.is_unlocked(*p)).collect()
    }

    /// Panels unlocked in `self` but not in `before`.
    #[must_use]
    pub fn newly_unlocked(&self, before: &Self) -> Vec<Panel> {
        Panel::ALL
            .into_iter()
            .filter(|p| self.is_unlocked(*p) && !before.is_unlocked(*p))
            .collect()
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One chat line. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub sender: Sender,
}

impl Message {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::User }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::Assistant }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
