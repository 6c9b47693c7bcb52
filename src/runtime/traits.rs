//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::{Database, DbError, NewRecord, Record, RecordQuery};
use crate::state_machine::SessionState;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Identity of the user a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure of the durable medium behind a store
#[derive(Debug, Error)]
#[error("Storage error: {0}")]
pub struct StorageError(pub String);

impl From<DbError> for StorageError {
    fn from(e: DbError) -> Self {
        StorageError(e.to_string())
    }
}

/// Source of the calendar date stamped on new records
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Persistent incident records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record dated today
    async fn insert(&self, record: &NewRecord) -> Result<Record, StorageError>;

    /// Records in the inclusive date range matching the assistant filter
    async fn query(&self, query: &RecordQuery) -> Result<Vec<Record>, StorageError>;

    /// Returns whether a record existed and was removed
    async fn delete(&self, id: i64) -> Result<bool, StorageError>;

    async fn get(&self, id: i64) -> Result<Option<Record>, StorageError>;
}

/// Working memory for in-progress wizards, keyed by user
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current state; users without a session are idle
    async fn load(&self, user: UserId) -> Result<SessionState, StorageError>;

    /// Store the state; saving `Idle` evicts the session
    async fn save(&self, user: UserId, state: &SessionState) -> Result<(), StorageError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn insert(&self, record: &NewRecord) -> Result<Record, StorageError> {
        (**self).insert(record).await
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<Record>, StorageError> {
        (**self).query(query).await
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        (**self).delete(id).await
    }

    async fn get(&self, id: i64) -> Result<Option<Record>, StorageError> {
        (**self).get(id).await
    }
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load(&self, user: UserId) -> Result<SessionState, StorageError> {
        (**self).load(user).await
    }

    async fn save(&self, user: UserId, state: &SessionState) -> Result<(), StorageError> {
        (**self).save(user, state).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Wall-clock date in the server's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Adapter to use Database as a `RecordStore`
#[derive(Clone)]
pub struct DatabaseStore<C: Clock> {
    db: Database,
    clock: C,
}

impl<C: Clock> DatabaseStore<C> {
    pub fn new(db: Database, clock: C) -> Self {
        Self { db, clock }
    }

    #[allow(dead_code)] // Useful for tests
    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl<C: Clock> RecordStore for DatabaseStore<C> {
    async fn insert(&self, record: &NewRecord) -> Result<Record, StorageError> {
        let created_at = self.clock.today();
        Ok(self.db.insert_record(record, created_at)?)
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<Record>, StorageError> {
        Ok(self.db.query_records(query)?)
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        Ok(self.db.delete_record(id)?)
    }

    async fn get(&self, id: i64) -> Result<Option<Record>, StorageError> {
        Ok(self.db.get_record(id)?)
    }
}

/// Process-local sessions; lost on restart
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<UserId, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a wizard in progress
    #[allow(dead_code)] // Used in tests
    pub fn active_count(&self) -> usize {
        self.sessions.lock().map_or(0, |s| s.len())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user: UserId) -> Result<SessionState, StorageError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| StorageError("session map lock poisoned".to_string()))?;
        Ok(sessions.get(&user).cloned().unwrap_or_default())
    }

    async fn save(&self, user: UserId, state: &SessionState) -> Result<(), StorageError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| StorageError("session map lock poisoned".to_string()))?;
        if state.is_idle() {
            sessions.remove(&user);
        } else {
            sessions.insert(user, state.clone());
        }
        Ok(())
    }
}
