//! Pure state transition function
//!
//! Given the same state, context and event this always produces the same new
//! state and effects. All store access is expressed as effects whose outcomes
//! come back as events.

use super::{Command, Effect, Event, IntakeContext, SessionState};
use crate::db::{NewRecord, RecordQuery};
use crate::domain::{
    parse_date, parse_description, parse_end_date, parse_record_id, AssistantFilter,
    ValidationError,
};
use thiserror::Error;

pub const HELP_TEXT: &str = "Commands:\n\n\
    /start - add a record\n\
    /export - export records to a spreadsheet\n\
    /delete - delete a record by ID\n\
    /cancel - abandon the current step\n\n\
    Tip: run /export first to look up record IDs.";

const PROMPT_DESCRIPTION: &str = "Describe the problem:";
const PROMPT_DESCRIPTION_AGAIN: &str = "The description cannot be empty. Describe the problem:";
const PROMPT_ASSISTANT: &str = "Who is handling it?";
const PROMPT_LEVEL: &str = "How serious is it?";
const PROMPT_USE_BUTTONS: &str = "Please pick one of the buttons.";
const PROMPT_EXPORT_ASSISTANT: &str = "Choose an assistant:";
const PROMPT_DATE_FROM: &str = "Enter the start date (YYYY-MM-DD):";
const PROMPT_DATE_TO: &str = "Enter the end date (YYYY-MM-DD):";
const PROMPT_BAD_DATE: &str = "That is not a valid date. Use the YYYY-MM-DD format:";
const PROMPT_DELETE_ID: &str =
    "Enter the ID of the record to delete.\n\nTip: run /export first to look up record IDs.";
const PROMPT_ID_ONLY: &str = "Enter only the numeric record ID.";
const IDLE_HINT: &str = "Nothing is in progress. Send /help to see what I can do.";
const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
const CANCELLED: &str = "Cancelled.";
const NO_DATA: &str = "No records for this period.";
pub const STORAGE_FAILED: &str =
    "Something went wrong while accessing the records. Please try again.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
#[allow(clippy::too_many_lines)] // One arm per (state, event) pair
pub fn transition(
    state: &SessionState,
    context: &IntakeContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Commands (valid from every state)
        // ============================================================

        // Starting a wizard discards whatever the previous one collected
        (_, Event::Command(Command::Start)) => {
            Ok(TransitionResult::new(SessionState::AwaitingDescription)
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::reply_removing_keyboard(PROMPT_DESCRIPTION)))
        }

        (_, Event::Command(Command::Export)) => {
            Ok(TransitionResult::new(SessionState::AwaitingExportAssistant)
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::reply_with_buttons(
                    PROMPT_EXPORT_ASSISTANT,
                    context.export_buttons(),
                )))
        }

        (_, Event::Command(Command::Delete)) => {
            Ok(TransitionResult::new(SessionState::AwaitingDeleteId)
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::reply_removing_keyboard(PROMPT_DELETE_ID)))
        }

        (state, Event::Command(Command::Help)) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(HELP_TEXT)))
        }

        (SessionState::Idle, Event::Command(Command::Cancel)) => {
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effect(Effect::reply_removing_keyboard(NOTHING_TO_CANCEL)))
        }

        (_, Event::Command(Command::Cancel)) => Ok(TransitionResult::new(SessionState::Idle)
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::reply_removing_keyboard(CANCELLED))),

        (SessionState::Idle, Event::Text(_)) => {
            Ok(TransitionResult::new(SessionState::Idle).with_effect(Effect::reply(IDLE_HINT)))
        }

        // ============================================================
        // Intake wizard
        // ============================================================
        (SessionState::AwaitingDescription, Event::Text(text)) => match parse_description(&text) {
            Ok(description) => Ok(TransitionResult::new(SessionState::AwaitingAssistant {
                description,
            })
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::reply_with_buttons(
                PROMPT_ASSISTANT,
                context.assistant_buttons(),
            ))),
            Err(_) => Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::reply(PROMPT_DESCRIPTION_AGAIN))),
        },

        (SessionState::AwaitingAssistant { description }, Event::Text(text)) => {
            match context.roster.parse(&text) {
                Ok(assistant) => Ok(TransitionResult::new(SessionState::AwaitingLevel {
                    description: description.clone(),
                    assistant,
                })
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::reply_with_buttons(
                    PROMPT_LEVEL,
                    context.level_buttons(),
                ))),
                Err(_) => Ok(TransitionResult::new(state.clone()).with_effect(
                    Effect::reply_with_buttons(PROMPT_USE_BUTTONS, context.assistant_buttons()),
                )),
            }
        }

        // The wizard holds its state until the store confirms the write, so a
        // failed insert leaves the user able to resend the level.
        (SessionState::AwaitingLevel { description, assistant }, Event::Text(text)) => {
            match context.levels.parse(&text) {
                Ok(level) => Ok(TransitionResult::new(state.clone()).with_effect(
                    Effect::InsertRecord {
                        record: NewRecord {
                            description: description.clone(),
                            assistant: assistant.clone(),
                            level,
                        },
                    },
                )),
                Err(_) => Ok(TransitionResult::new(state.clone()).with_effect(
                    Effect::reply_with_buttons(PROMPT_USE_BUTTONS, context.level_buttons()),
                )),
            }
        }

        (SessionState::AwaitingLevel { .. }, Event::RecordSaved { record }) => {
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::reply_removing_keyboard(format!(
                    "Saved as record #{}.",
                    record.id
                ))))
        }

        // ============================================================
        // Export wizard
        // ============================================================
        (SessionState::AwaitingExportAssistant, Event::Text(text)) => {
            match AssistantFilter::parse(&text, &context.roster, &context.all_label) {
                Ok(filter) => Ok(TransitionResult::new(SessionState::AwaitingDateFrom { filter })
                    .with_effect(Effect::PersistSession)
                    .with_effect(Effect::reply_removing_keyboard(PROMPT_DATE_FROM))),
                Err(_) => Ok(TransitionResult::new(state.clone()).with_effect(
                    Effect::reply_with_buttons(PROMPT_USE_BUTTONS, context.export_buttons()),
                )),
            }
        }

        (SessionState::AwaitingDateFrom { filter }, Event::Text(text)) => match parse_date(&text) {
            Ok(date_from) => Ok(TransitionResult::new(SessionState::AwaitingDateTo {
                filter: filter.clone(),
                date_from,
            })
            .with_effect(Effect::PersistSession)
            .with_effect(Effect::reply(PROMPT_DATE_TO))),
            Err(_) => {
                Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(PROMPT_BAD_DATE)))
            }
        },

        (SessionState::AwaitingDateTo { filter, date_from }, Event::Text(text)) => {
            match parse_end_date(&text, *date_from) {
                Ok(date_to) => Ok(TransitionResult::new(state.clone()).with_effect(
                    Effect::FetchRecords {
                        query: RecordQuery {
                            date_from: *date_from,
                            date_to,
                            filter: filter.clone(),
                        },
                    },
                )),
                Err(ValidationError::InvertedRange { from, .. }) => {
                    Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(format!(
                        "The end date cannot be earlier than {from}. {PROMPT_DATE_TO}"
                    ))))
                }
                Err(_) => Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::reply(PROMPT_BAD_DATE))),
            }
        }

        (SessionState::AwaitingDateTo { .. }, Event::RecordsFetched { records }) => {
            let result =
                TransitionResult::new(SessionState::Idle).with_effect(Effect::PersistSession);
            if records.is_empty() {
                Ok(result.with_effect(Effect::reply(NO_DATA)))
            } else {
                Ok(result.with_effect(Effect::SendExport { records }))
            }
        }

        // ============================================================
        // Delete flow
        // ============================================================
        (SessionState::AwaitingDeleteId, Event::Text(text)) => match parse_record_id(&text) {
            Ok(id) => {
                Ok(TransitionResult::new(state.clone()).with_effect(Effect::DeleteRecord { id }))
            }
            Err(_) => {
                Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(PROMPT_ID_ONLY)))
            }
        },

        (SessionState::AwaitingDeleteId, Event::RecordDeleted { record }) => {
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effect(Effect::PersistSession)
                .with_effect(Effect::reply(format!("Record #{} deleted.", record.id))))
        }

        // Not found keeps the flow open so the user can try another id
        (SessionState::AwaitingDeleteId, Event::RecordMissing { id }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(format!(
                "No record with ID {id}. Enter another ID or /cancel."
            ))))
        }

        // ============================================================
        // Storage failures
        // ============================================================

        // Abort the step without moving: nothing was written
        (state, Event::StorageFailed) if !state.is_idle() => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(STORAGE_FAILED)))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {}",
            state.name(),
            event.name()
        ))),
    }
}
