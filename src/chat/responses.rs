//! The response table: greeting, ordered rules, fallback.
//!
//! The built-in table ships with the binary. A YAML file with the same shape
//! can replace it at startup:
//!
//! ```yaml
//! greeting: "What can I help you build today?"
//! fallback: "I'll help with that."
//! rules:
//!   - triggers: ["team|teammate|member"]
//!     reply: "I've added your team members."
//!     signal: teamSetup
//! ```

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use super::Panel;

#[derive(Debug, thiserror::Error)]
pub enum ResponseTableError {
    #[error("failed to read response table {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid response table yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("rule {rule}: invalid trigger pattern {pattern:?}: {source}")]
    Pattern { rule: usize, pattern: String, source: regex::Error },
    #[error("rule {rule}: unknown signal {signal:?}")]
    UnknownSignal { rule: usize, signal: String },
    #[error("rule {rule}: has no triggers")]
    NoTriggers { rule: usize },
}

/// One rule: any trigger matching selects `reply` and `signal`.
#[derive(Debug, Clone)]
pub struct ResponseRule {
    pub triggers: Vec<Regex>,
    pub reply: String,
    pub signal: Option<Panel>,
}

impl ResponseRule {
    /// Unanchored, case-insensitive search over `input`.
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        self.triggers.iter().any(|re| re.is_match(input))
    }
}

#[derive(Debug, Clone)]
pub struct ResponseTable {
    pub greeting: String,
    pub fallback: String,
    pub rules: Vec<ResponseRule>,
}

#[derive(Deserialize)]
struct TableFile {
    greeting: String,
    fallback: String,
    rules: Vec<RuleFile>,
}

#[derive(Deserialize)]
struct RuleFile {
    triggers: Vec<String>,
    reply: String,
    signal: Option<String>,
}

const BUILTIN_GREETING: &str = "What can I help you build today? 3D asset, scene, or something else?";
const BUILTIN_FALLBACK: &str = "I'll help with that. What else would you like to configure?";

const BUILTIN_RULES: &[(&str, &str, Option<Panel>)] = &[
    ("build|robot|game", "That sounds cool! Is this for a video game, VR, or something else?", None),
    ("game", "Great! Would you like me to help set up your Sci-Fi Robot project?", None),
    ("yes|setup", "What is the timeline for the project?", None),
    ("month|week|timeline", "Any milestones or workstreams to divide the project into?", None),
    (
        "milestone|object|texture|animation",
        "Here's your project setup with the milestones you mentioned. You can see the timeline visualization on the right.",
        Some(Panel::ProjectSetup),
    ),
    (
        "team|teammate|member",
        "I've added your team members to the project dashboard. Would you like to add more details about their roles?",
        Some(Panel::TeamSetup),
    ),
    (
        "tool|compare|software",
        "Here's a comparison of common 3D modeling tools that could be useful for your project.",
        Some(Panel::ToolsComparison),
    ),
    (
        "file|folder|asset",
        "I've opened the file manager for your project assets. You can organize models and textures into folders.",
        Some(Panel::FileManagement),
    ),
    (
        "version|history|revision",
        "Here's the version history for your files. Every upload is kept so you can compare or roll back.",
        Some(Panel::VersionControl),
    ),
    (
        "progress|graph|chart|analytics",
        "Here's how the project is tracking. The analytics view shows task completion and milestone progress.",
        Some(Panel::ProgressGraphs),
    ),
    (
        "import|export",
        "You can import existing assets or export your project from the panel on the right.",
        Some(Panel::ImportExport),
    ),
];

fn compile(rule: usize, pattern: &str) -> Result<Regex, ResponseTableError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ResponseTableError::Pattern { rule, pattern: pattern.to_owned(), source })
}

impl ResponseTable {
    /// The table the assistant ships with.
    ///
    /// # Errors
    ///
    /// Only if a built-in pattern fails to compile.
    pub fn builtin() -> Result<Self, ResponseTableError> {
        let rules = BUILTIN_RULES
            .iter()
            .enumerate()
            .map(|(i, (pattern, reply, signal))| {
                Ok(ResponseRule { triggers: vec![compile(i, pattern)?], reply: (*reply).to_owned(), signal: *signal })
            })
            .collect::<Result<Vec<_>, ResponseTableError>>()?;
        Ok(Self { greeting: BUILTIN_GREETING.to_owned(), fallback: BUILTIN_FALLBACK.to_owned(), rules })
    }

    /// Parse a YAML table, compiling every trigger up front.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed YAML, an invalid regex, an unknown
    /// signal, or a rule without triggers.
    pub fn from_yaml(source: &str) -> Result<Self, ResponseTableError> {
        let file: TableFile = serde_yaml::from_str(source)?;
        let mut rules = Vec::with_capacity(file.rules.len());
        for (i, rule) in file.rules.into_iter().enumerate() {
            if rule.triggers.is_empty() {
                return Err(ResponseTableError::NoTriggers { rule: i });
            }
            let triggers = rule
                .triggers
                .iter()
                .map(|pattern| compile(i, pattern))
                .collect::<Result<Vec<_>, _>>()?;
            let signal = match rule.signal {
                None => None,
                Some(name) => {
                    Some(Panel::parse(&name).ok_or(ResponseTableError::UnknownSignal { rule: i, signal: name })?)
                }
            };
            rules.push(ResponseRule { triggers, reply: rule.reply, signal });
        }
        Ok(Self { greeting: file.greeting, fallback: file.fallback, rules })
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self, ResponseTableError> {
        let source = std::fs::read_to_string(path)
            .map_err(|source| ResponseTableError::Io { path: path.display().to_string(), source })?;
        Self::from_yaml(&source)
    }
}

#[cfg(test)]
#[path = "responses_test.rs"]
mod tests;
