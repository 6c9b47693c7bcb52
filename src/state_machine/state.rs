//! Session state types

use crate::domain::{Assistant, AssistantFilter, AssistantRoster, LevelLabels};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Session State
// ============================================================================

/// Where a user is in one of the wizards, together with whatever the wizard
/// has collected so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// No wizard active
    #[default]
    Idle,

    // Intake wizard
    AwaitingDescription,
    AwaitingAssistant {
        description: String,
    },
    AwaitingLevel {
        description: String,
        assistant: Assistant,
    },

    // Export wizard
    AwaitingExportAssistant,
    AwaitingDateFrom {
        filter: AssistantFilter,
    },
    AwaitingDateTo {
        filter: AssistantFilter,
        date_from: NaiveDate,
    },

    // Delete flow
    AwaitingDeleteId,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Stable name for logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingDescription => "awaiting_description",
            SessionState::AwaitingAssistant { .. } => "awaiting_assistant",
            SessionState::AwaitingLevel { .. } => "awaiting_level",
            SessionState::AwaitingExportAssistant => "awaiting_export_assistant",
            SessionState::AwaitingDateFrom { .. } => "awaiting_date_from",
            SessionState::AwaitingDateTo { .. } => "awaiting_date_to",
            SessionState::AwaitingDeleteId => "awaiting_delete_id",
        }
    }
}

// ============================================================================
// Context
// ============================================================================

/// Immutable configuration the transition function validates against
#[derive(Debug, Clone)]
pub struct IntakeContext {
    pub roster: AssistantRoster,
    pub levels: LevelLabels,
    /// Export sentinel meaning "no assistant restriction"
    pub all_label: String,
}

pub const DEFAULT_ALL_LABEL: &str = "All";

impl IntakeContext {
    pub fn new(roster: AssistantRoster, levels: LevelLabels, all_label: impl Into<String>) -> Self {
        Self {
            roster,
            levels,
            all_label: all_label.into(),
        }
    }

    /// One button per assistant on a single row
    pub fn assistant_buttons(&self) -> Vec<Vec<String>> {
        vec![self.roster.labels().map(String::from).collect()]
    }

    /// One level per row, in severity order
    pub fn level_buttons(&self) -> Vec<Vec<String>> {
        self.levels.labels().map(|l| vec![l.to_string()]).collect()
    }

    /// "All" on its own row above the assistants
    pub fn export_buttons(&self) -> Vec<Vec<String>> {
        let mut rows = vec![vec![self.all_label.clone()]];
        rows.extend(self.assistant_buttons());
        rows
    }
}
