//! Effects produced by state transitions

use crate::db::{NewRecord, Record, RecordQuery};

/// Keyboard attached to a reply
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReplyMarkup {
    /// Leave whatever keyboard the client shows
    #[default]
    Keep,
    /// Suggested reply buttons, one inner vec per row
    Buttons(Vec<Vec<String>>),
    /// Hide the custom keyboard
    Remove,
}

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Send text back to the user
    Reply { text: String, markup: ReplyMarkup },

    /// Persist the new session state (idle evicts the session)
    PersistSession,

    /// Write a completed intake to the record store
    InsertRecord { record: NewRecord },

    /// Read records for an export
    FetchRecords { query: RecordQuery },

    /// Look up and delete a record by id
    DeleteRecord { id: i64 },

    /// Render records into a spreadsheet and send it
    SendExport { records: Vec<Record> },
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply {
            text: text.into(),
            markup: ReplyMarkup::Keep,
        }
    }

    pub fn reply_with_buttons(text: impl Into<String>, buttons: Vec<Vec<String>>) -> Self {
        Effect::Reply {
            text: text.into(),
            markup: ReplyMarkup::Buttons(buttons),
        }
    }

    pub fn reply_removing_keyboard(text: impl Into<String>) -> Self {
        Effect::Reply {
            text: text.into(),
            markup: ReplyMarkup::Remove,
        }
    }

    /// Whether this effect writes to the record store
    #[allow(dead_code)] // Used in tests
    pub fn is_store_write(&self) -> bool {
        matches!(self, Effect::InsertRecord { .. } | Effect::DeleteRecord { .. })
    }
}
