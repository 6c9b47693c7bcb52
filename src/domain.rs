//! Closed vocabularies accepted by the intake dialogue
//!
//! Every piece of user input that must belong to a fixed set is parsed here
//! into a typed value. Handlers never compare raw strings against literals.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Canonical on-disk and on-wire date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input that does not belong to the expected set or type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("description is empty")]
    EmptyDescription,
    #[error("unknown assistant: {0}")]
    UnknownAssistant(String),
    #[error("unknown level: {0}")]
    UnknownLevel(String),
    #[error("not a YYYY-MM-DD date: {0}")]
    InvalidDate(String),
    #[error("end date {to} is earlier than start date {from}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },
    #[error("not a numeric record id: {0}")]
    InvalidRecordId(String),
}

// ============================================================================
// Assistants
// ============================================================================

/// Label of the party handling an incident
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assistant(String);

impl Assistant {
    /// Wrap a label read back from storage. Stored rows are trusted even if
    /// the roster has since changed.
    pub fn from_stored(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Assistant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The configured closed set of assistants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantRoster {
    assistants: Vec<Assistant>,
}

impl AssistantRoster {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assistants: labels.into_iter().map(|l| Assistant(l.into())).collect(),
        }
    }

    /// Exact match against the configured labels
    pub fn parse(&self, input: &str) -> Result<Assistant, ValidationError> {
        self.assistants
            .iter()
            .find(|a| a.as_str() == input)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownAssistant(input.to_string()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.assistants.iter().map(Assistant::as_str)
    }
}

/// Assistant restriction applied to an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "assistant", rename_all = "snake_case")]
pub enum AssistantFilter {
    All,
    Only(Assistant),
}

impl AssistantFilter {
    /// Accepts the "all" sentinel label or any roster label
    pub fn parse(
        input: &str,
        roster: &AssistantRoster,
        all_label: &str,
    ) -> Result<Self, ValidationError> {
        if input == all_label {
            return Ok(AssistantFilter::All);
        }
        roster.parse(input).map(AssistantFilter::Only)
    }

    #[cfg(test)]
    pub fn matches(&self, assistant: &Assistant) -> bool {
        match self {
            AssistantFilter::All => true,
            AssistantFilter::Only(only) => only == assistant,
        }
    }
}

// ============================================================================
// Severity levels
// ============================================================================

/// Incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Minor,
    Moderate,
    Serious,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Minor, Level::Moderate, Level::Serious];

    pub fn as_i64(self) -> i64 {
        match self {
            Level::Minor => 1,
            Level::Moderate => 2,
            Level::Serious => 3,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(Level::Minor),
            2 => Some(Level::Moderate),
            3 => Some(Level::Serious),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Level::Minor => "minor",
            Level::Moderate => "moderate",
            Level::Serious => "serious",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_i64(), self.name())
    }
}

/// Button labels that map onto the three levels, in severity order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelLabels {
    labels: [String; 3],
}

impl LevelLabels {
    pub fn new(
        minor: impl Into<String>,
        moderate: impl Into<String>,
        serious: impl Into<String>,
    ) -> Self {
        Self {
            labels: [minor.into(), moderate.into(), serious.into()],
        }
    }

    pub fn label(&self, level: Level) -> &str {
        match level {
            Level::Minor => &self.labels[0],
            Level::Moderate => &self.labels[1],
            Level::Serious => &self.labels[2],
        }
    }

    pub fn parse(&self, input: &str) -> Result<Level, ValidationError> {
        Level::ALL
            .into_iter()
            .find(|level| self.label(*level) == input)
            .ok_or_else(|| ValidationError::UnknownLevel(input.to_string()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for LevelLabels {
    fn default() -> Self {
        Self::new("1 — minor", "2 — moderate", "3 — serious")
    }
}

// ============================================================================
// Free-form fields
// ============================================================================

/// Reject blank descriptions; the text itself is stored as typed
pub fn parse_description(input: &str) -> Result<String, ValidationError> {
    if input.trim().is_empty() {
        Err(ValidationError::EmptyDescription)
    } else {
        Ok(input.to_string())
    }
}

/// Only four-digit years are accepted so the stored text sorts in
/// calendar order; chrono alone would also take `+10000-01-01`.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    let invalid = || ValidationError::InvalidDate(trimmed.to_string());
    let shape = Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").map_err(|_| invalid())?;
    if !shape.is_match(trimmed) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| invalid())
}

/// End of an inclusive range; it may equal but never precede the start
pub fn parse_end_date(input: &str, from: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let to = parse_date(input)?;
    if to < from {
        Err(ValidationError::InvertedRange { from, to })
    } else {
        Ok(to)
    }
}

pub fn parse_record_id(input: &str) -> Result<i64, ValidationError> {
    let trimmed = input.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidRecordId(trimmed.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
