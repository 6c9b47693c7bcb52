//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use crate::db::{NewRecord, Record, RecordQuery};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// Fixed Clock
// ============================================================================

/// Clock pinned to a date that tests can move
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap() = today;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap()
    }
}

// ============================================================================
// Mock Record Store
// ============================================================================

/// In-memory record store with a switch that makes every call fail
pub struct MockRecordStore {
    records: Mutex<Vec<Record>>,
    next_id: Mutex<i64>,
    clock: FixedClock,
    failing: AtomicBool,
}

impl MockRecordStore {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
            clock: FixedClock::new(today),
            failing: AtomicBool::new(false),
        }
    }

    pub fn clock(&self) -> &FixedClock {
        &self.clock
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of stored records in id order
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError("disk I/O error".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn insert(&self, record: &NewRecord) -> Result<Record, StorageError> {
        self.check()?;
        let mut next_id = self.next_id.lock().unwrap();
        let stored = Record {
            id: *next_id,
            description: record.description.clone(),
            assistant: record.assistant.clone(),
            level: record.level,
            created_at: self.clock.today(),
        };
        *next_id += 1;
        self.records.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<Record>, StorageError> {
        self.check()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }

    async fn get(&self, id: i64) -> Result<Option<Record>, StorageError> {
        self.check()?;
        Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::domain::{Assistant, AssistantRoster, Level, LevelLabels};
    use crate::runtime::{IntakeRuntime, Outgoing};
    use crate::state_machine::{IntakeContext, ReplyMarkup, SessionState};
    use std::sync::Arc;

    const USER: UserId = UserId(42);

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn test_context() -> IntakeContext {
        IntakeContext::new(
            AssistantRoster::new(["Katerina", "Avelina"]),
            LevelLabels::default(),
            "All",
        )
    }

    fn test_runtime() -> (
        IntakeRuntime<Arc<MockRecordStore>, Arc<InMemorySessionStore>>,
        Arc<MockRecordStore>,
    ) {
        let store = Arc::new(MockRecordStore::new(date("2024-03-10")));
        let runtime = IntakeRuntime::new(
            test_context(),
            store.clone(),
            Arc::new(InMemorySessionStore::new()),
        );
        (runtime, store)
    }

    async fn say<R: RecordStore, S: SessionStore>(
        runtime: &IntakeRuntime<R, S>,
        text: &str,
    ) -> Vec<Outgoing> {
        runtime.handle_message(USER, text).await
    }

    async fn state_of<R: RecordStore>(
        runtime: &IntakeRuntime<R, Arc<InMemorySessionStore>>,
    ) -> SessionState {
        runtime.sessions().load(USER).await.unwrap()
    }

    fn last_text(outgoing: &[Outgoing]) -> &str {
        outgoing.iter().rev().find_map(Outgoing::text).unwrap()
    }

    #[tokio::test]
    async fn test_mock_store_fail_switch() {
        let store = MockRecordStore::new(date("2024-01-01"));
        store.set_failing(true);
        let new = NewRecord {
            description: "x".to_string(),
            assistant: Assistant::from_stored("Katerina"),
            level: Level::Minor,
        };
        assert!(store.insert(&new).await.is_err());
        store.set_failing(false);
        assert_eq!(store.insert(&new).await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_full_intake_creates_one_record() {
        let (runtime, store) = test_runtime();

        say(&runtime, "/start").await;
        say(&runtime, "Printer is jammed").await;
        let replies = say(&runtime, "Avelina").await;
        assert!(matches!(
            &replies[0],
            Outgoing::Text { markup: ReplyMarkup::Buttons(rows), .. } if rows.len() == 3
        ));

        store.clock().set(date("2024-03-11"));
        let replies = say(&runtime, "3 — serious").await;
        assert_eq!(last_text(&replies), "Saved as record #1.");

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "Printer is jammed");
        assert_eq!(records[0].assistant.as_str(), "Avelina");
        assert_eq!(records[0].level, Level::Serious);
        assert_eq!(records[0].created_at, date("2024-03-11"));
        assert!(state_of(&runtime).await.is_idle());
        assert_eq!(runtime.sessions().active_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_assistant_reprompts_without_writing() {
        let (runtime, store) = test_runtime();

        say(&runtime, "/start").await;
        say(&runtime, "Broken chair").await;
        let replies = say(&runtime, "Somebody else").await;

        assert_eq!(last_text(&replies), "Please pick one of the buttons.");
        assert_eq!(
            state_of(&runtime).await,
            SessionState::AwaitingAssistant {
                description: "Broken chair".to_string()
            }
        );
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_command_abandons_wizard_midway() {
        let (runtime, store) = test_runtime();

        say(&runtime, "/start").await;
        say(&runtime, "Broken chair").await;
        say(&runtime, "/export").await;

        assert_eq!(state_of(&runtime).await, SessionState::AwaitingExportAssistant);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_export_empty_range_sends_no_document() {
        let (runtime, _store) = test_runtime();

        say(&runtime, "/export").await;
        say(&runtime, "All").await;
        say(&runtime, "2023-01-01").await;
        let replies = say(&runtime, "2023-12-31").await;

        assert_eq!(last_text(&replies), "No records for this period.");
        assert!(!replies.iter().any(|o| matches!(o, Outgoing::Document(_))));
        assert!(state_of(&runtime).await.is_idle());
    }

    #[tokio::test]
    async fn test_export_sends_spreadsheet() {
        let (runtime, _store) = test_runtime();

        for text in ["/start", "Leaking tap", "Katerina", "1 — minor"] {
            say(&runtime, text).await;
        }
        say(&runtime, "/export").await;
        say(&runtime, "Katerina").await;
        say(&runtime, "2024-03-01").await;
        let replies = say(&runtime, "2024-03-31").await;

        let document = replies
            .iter()
            .find_map(|o| match o {
                Outgoing::Document(d) => Some(d),
                Outgoing::Text { .. } => None,
            })
            .unwrap();
        assert_eq!(document.filename, "export.xlsx");
        assert_eq!(document.row_count, 1);
    }

    #[tokio::test]
    async fn test_bad_date_reprompts() {
        let (runtime, _store) = test_runtime();

        say(&runtime, "/export").await;
        say(&runtime, "All").await;
        let replies = say(&runtime, "last tuesday").await;

        assert_eq!(
            last_text(&replies),
            "That is not a valid date. Use the YYYY-MM-DD format:"
        );
        assert!(matches!(
            state_of(&runtime).await,
            SessionState::AwaitingDateFrom { .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_missing_keeps_prompting() {
        let (runtime, store) = test_runtime();

        for text in ["/start", "Leaking tap", "Katerina", "2 — moderate"] {
            say(&runtime, text).await;
        }

        say(&runtime, "/delete").await;
        let replies = say(&runtime, "99").await;
        assert_eq!(last_text(&replies), "No record with ID 99. Enter another ID or /cancel.");
        assert_eq!(state_of(&runtime).await, SessionState::AwaitingDeleteId);
        assert_eq!(store.records().len(), 1);

        let replies = say(&runtime, " 1 ").await;
        assert_eq!(last_text(&replies), "Record #1 deleted.");
        assert!(store.records().is_empty());
        assert!(state_of(&runtime).await.is_idle());

        // Deleting the same id again is not found and changes nothing
        say(&runtime, "/delete").await;
        let replies = say(&runtime, "1").await;
        assert_eq!(last_text(&replies), "No record with ID 1. Enter another ID or /cancel.");
    }

    #[tokio::test]
    async fn test_storage_failure_holds_step() {
        let (runtime, store) = test_runtime();

        for text in ["/start", "Leaking tap", "Katerina"] {
            say(&runtime, text).await;
        }

        store.set_failing(true);
        let replies = say(&runtime, "1 — minor").await;
        assert_eq!(
            last_text(&replies),
            "Something went wrong while accessing the records. Please try again."
        );
        assert!(matches!(state_of(&runtime).await, SessionState::AwaitingLevel { .. }));

        // Resending after the medium recovers completes the intake once
        store.set_failing(false);
        let replies = say(&runtime, "1 — minor").await;
        assert_eq!(last_text(&replies), "Saved as record #1.");
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_during_delete_holds_step() {
        let (runtime, store) = test_runtime();

        for text in ["/start", "Leaking tap", "Katerina", "2 — moderate"] {
            say(&runtime, text).await;
        }
        say(&runtime, "/delete").await;

        store.set_failing(true);
        let replies = say(&runtime, "1").await;
        assert_eq!(
            last_text(&replies),
            "Something went wrong while accessing the records. Please try again."
        );
        assert_eq!(state_of(&runtime).await, SessionState::AwaitingDeleteId);

        store.set_failing(false);
        assert_eq!(store.records().len(), 1);
        let replies = say(&runtime, "1").await;
        assert_eq!(last_text(&replies), "Record #1 deleted.");
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_during_export_holds_step() {
        let (runtime, store) = test_runtime();

        for text in ["/start", "Leaking tap", "Katerina", "1 — minor"] {
            say(&runtime, text).await;
        }
        say(&runtime, "/export").await;
        say(&runtime, "All").await;
        say(&runtime, "2024-03-01").await;

        store.set_failing(true);
        let replies = say(&runtime, "2024-03-31").await;
        assert_eq!(
            last_text(&replies),
            "Something went wrong while accessing the records. Please try again."
        );
        assert!(!replies.iter().any(|o| matches!(o, Outgoing::Document(_))));
        assert!(matches!(
            state_of(&runtime).await,
            SessionState::AwaitingDateTo { .. }
        ));

        store.set_failing(false);
        let replies = say(&runtime, "2024-03-31").await;
        assert!(replies.iter().any(|o| matches!(o, Outgoing::Document(d) if d.row_count == 1)));
    }

    #[tokio::test]
    async fn test_users_have_separate_sessions() {
        let (runtime, _store) = test_runtime();
        let other = UserId(7);

        runtime.handle_message(USER, "/start").await;
        runtime.handle_message(other, "/delete").await;

        assert_eq!(state_of(&runtime).await, SessionState::AwaitingDescription);
        assert_eq!(
            runtime.sessions().load(other).await.unwrap(),
            SessionState::AwaitingDeleteId
        );
    }

    #[tokio::test]
    async fn test_runtime_against_database_store() {
        let clock = FixedClock::new(date("2024-01-01"));
        let store = DatabaseStore::new(Database::open_in_memory().unwrap(), clock);
        let runtime = IntakeRuntime::new(test_context(), store, InMemorySessionStore::new());

        for text in ["/start", "Flooded basement", "Avelina", "3 — serious"] {
            runtime.handle_message(USER, text).await;
        }
        runtime.handle_message(USER, "/export").await;
        runtime.handle_message(USER, "Avelina").await;
        runtime.handle_message(USER, "2024-01-01").await;
        let replies = runtime.handle_message(USER, "2024-01-01").await;

        assert!(replies.iter().any(|o| matches!(o, Outgoing::Document(d) if d.row_count == 1)));
    }
}
