//! Events that can occur in a session

use crate::db::Record;

/// Slash commands understood by the dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Export,
    Delete,
    Cancel,
}

impl Command {
    /// Recognise `/name`, `/name@bot` and `/name with args`. Anything else,
    /// including unknown slash commands, is ordinary text.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "export" => Some(Command::Export),
            "delete" => Some(Command::Delete),
            "cancel" => Some(Command::Cancel),
            _ => None,
        }
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Command(Command),
    Text(String),

    // Store outcomes
    RecordSaved {
        record: Record,
    },
    RecordsFetched {
        records: Vec<Record>,
    },
    RecordDeleted {
        record: Record,
    },
    RecordMissing {
        id: i64,
    },
    /// The record store could not complete the requested operation
    StorageFailed,
}

impl Event {
    /// Classify an inbound message
    pub fn from_message(text: &str) -> Self {
        Command::parse(text).map_or_else(|| Event::Text(text.to_string()), Event::Command)
    }

    /// Stable name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::Command(_) => "command",
            Event::Text(_) => "text",
            Event::RecordSaved { .. } => "record_saved",
            Event::RecordsFetched { .. } => "records_fetched",
            Event::RecordDeleted { .. } => "record_deleted",
            Event::RecordMissing { .. } => "record_missing",
            Event::StorageFailed => "storage_failed",
        }
    }
}
