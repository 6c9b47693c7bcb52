//! Intake runtime executor

use super::traits::{RecordStore, SessionStore, StorageError, UserId};
use crate::export::{render_workbook, ExportDocument};
use crate::state_machine::{transition, Effect, Event, IntakeContext, ReplyMarkup, SessionState};

const EXPORT_FAILED: &str = "Could not build the spreadsheet. Please try again.";

/// Something to deliver back to the user, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text { text: String, markup: ReplyMarkup },
    Document(ExportDocument),
}

impl Outgoing {
    /// Text of a text reply
    #[allow(dead_code)] // Used in tests
    pub fn text(&self) -> Option<&str> {
        match self {
            Outgoing::Text { text, .. } => Some(text),
            Outgoing::Document(_) => None,
        }
    }
}

/// Generic intake runtime that can work with any record and session store
pub struct IntakeRuntime<R, S>
where
    R: RecordStore,
    S: SessionStore,
{
    context: IntakeContext,
    records: R,
    sessions: S,
}

/// Per-message working set threaded through effect execution
struct Turn {
    user: UserId,
    state: SessionState,
    outgoing: Vec<Outgoing>,
}

impl<R, S> IntakeRuntime<R, S>
where
    R: RecordStore,
    S: SessionStore,
{
    pub fn new(context: IntakeContext, records: R, sessions: S) -> Self {
        Self {
            context,
            records,
            sessions,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Run one inbound message to completion and collect the replies
    pub async fn handle_message(&self, user: UserId, text: &str) -> Vec<Outgoing> {
        let state = match self.sessions.load(user).await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(user_id = %user, error = %e, "Failed to load session");
                return vec![Outgoing::Text {
                    text: crate::state_machine::transition::STORAGE_FAILED.to_string(),
                    markup: ReplyMarkup::Keep,
                }];
            }
        };

        let event = Event::from_message(text);
        tracing::debug!(
            user_id = %user,
            state = state.name(),
            event = event.name(),
            "Inbound message"
        );

        let mut turn = Turn {
            user,
            state,
            outgoing: Vec::new(),
        };

        // Process events in a loop to handle store outcomes - no recursion
        let mut events_to_process = vec![event];

        while let Some(current_event) = events_to_process.pop() {
            let result = match transition(&turn.state, &self.context, current_event) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(user_id = %user, error = %e, "Dropping event");
                    break;
                }
            };

            if result.new_state != turn.state {
                tracing::info!(
                    user_id = %user,
                    from = turn.state.name(),
                    to = result.new_state.name(),
                    "Session state change"
                );
            }
            turn.state = result.new_state;

            for effect in result.effects {
                if let Some(generated_event) = self.execute_effect(&mut turn, effect).await {
                    events_to_process.push(generated_event);
                }
            }
        }

        turn.outgoing
    }

    /// Execute an effect and optionally return a generated event
    async fn execute_effect(&self, turn: &mut Turn, effect: Effect) -> Option<Event> {
        match effect {
            Effect::Reply { text, markup } => {
                turn.outgoing.push(Outgoing::Text { text, markup });
                None
            }

            Effect::PersistSession => {
                if let Err(e) = self.sessions.save(turn.user, &turn.state).await {
                    tracing::error!(user_id = %turn.user, error = %e, "Failed to persist session");
                }
                None
            }

            Effect::InsertRecord { record } => match self.records.insert(&record).await {
                Ok(record) => {
                    tracing::info!(
                        user_id = %turn.user,
                        record_id = record.id,
                        assistant = %record.assistant,
                        level = record.level.as_i64(),
                        "Record saved"
                    );
                    Some(Event::RecordSaved { record })
                }
                Err(e) => Some(storage_failed(turn.user, "insert", &e)),
            },

            Effect::FetchRecords { query } => match self.records.query(&query).await {
                Ok(records) => {
                    tracing::info!(
                        user_id = %turn.user,
                        count = records.len(),
                        from = %query.date_from,
                        to = %query.date_to,
                        "Records fetched for export"
                    );
                    Some(Event::RecordsFetched { records })
                }
                Err(e) => Some(storage_failed(turn.user, "query", &e)),
            },

            Effect::DeleteRecord { id } => self.delete_record(turn.user, id).await,

            Effect::SendExport { records } => {
                match render_workbook(&records) {
                    Ok(document) => turn.outgoing.push(Outgoing::Document(document)),
                    Err(e) => {
                        tracing::error!(
                            user_id = %turn.user,
                            error = %e,
                            "Failed to render export"
                        );
                        turn.outgoing.push(Outgoing::Text {
                            text: EXPORT_FAILED.to_string(),
                            markup: ReplyMarkup::Keep,
                        });
                    }
                }
                None
            }
        }
    }

    /// Look the record up first so the confirmation can name what was removed
    async fn delete_record(&self, user: UserId, id: i64) -> Option<Event> {
        let record = match self.records.get(id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Some(Event::RecordMissing { id }),
            Err(e) => return Some(storage_failed(user, "get", &e)),
        };

        match self.records.delete(id).await {
            Ok(true) => {
                tracing::info!(user_id = %user, record_id = id, "Record deleted");
                Some(Event::RecordDeleted { record })
            }
            // Raced with another delete
            Ok(false) => Some(Event::RecordMissing { id }),
            Err(e) => Some(storage_failed(user, "delete", &e)),
        }
    }
}

fn storage_failed(user: UserId, operation: &str, error: &StorageError) -> Event {
    tracing::error!(user_id = %user, operation, error = %error, "Record store operation failed");
    Event::StorageFailed
}
