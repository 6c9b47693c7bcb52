//! Record store for incident reports
//!
//! Provides persistence for the single `records` table.

mod schema;


pub use schema::*;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database connection lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

const RECORD_COLUMNS: &str = "id, description, assistant, level, created_at";

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    // ==================== Record Operations ====================

    /// Insert a record stamped with `created_at`, returning it with its new id
    pub fn insert_record(&self, record: &NewRecord, created_at: NaiveDate) -> DbResult<Record> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO records (description, assistant, level, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.description,
                record.assistant,
                record.level,
                date_to_sql(created_at)
            ],
        )?;

        Ok(Record {
            id: conn.last_insert_rowid(),
            description: record.description.clone(),
            assistant: record.assistant.clone(),
            level: record.level,
            created_at,
        })
    }

    /// Point lookup by id
    pub fn get_record(&self, id: i64) -> DbResult<Option<Record>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"
        ))?;

        stmt.query_row(params![id], parse_record_row)
            .optional()
            .map_err(DbError::from)
    }

    /// Records created within the inclusive date range, optionally limited to
    /// one assistant, in insertion order
    pub fn query_records(&self, query: &RecordQuery) -> DbResult<Vec<Record>> {
        let conn = self.lock()?;
        let from = date_to_sql(query.date_from);
        let to = date_to_sql(query.date_to);

        match &query.filter {
            crate::domain::AssistantFilter::All => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM records
                     WHERE created_at BETWEEN ?1 AND ?2
                     ORDER BY id ASC"
                ))?;
                let rows = stmt.query_map(params![from, to], parse_record_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
            }
            crate::domain::AssistantFilter::Only(assistant) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM records
                     WHERE created_at BETWEEN ?1 AND ?2 AND assistant = ?3
                     ORDER BY id ASC"
                ))?;
                let rows = stmt.query_map(params![from, to, assistant], parse_record_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
            }
        }
    }

    /// Delete a record; returns whether a row was removed
    pub fn delete_record(&self, id: i64) -> DbResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM records WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    pub fn count_records(&self) -> DbResult<i64> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .map_err(DbError::from)
    }
}

/// Parse a record row selected with `RECORD_COLUMNS`
fn parse_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    let created_at = row.get_ref(4).and_then(|value| {
        date_from_sql(value).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, value.data_type(), Box::new(e))
        })
    })?;

    Ok(Record {
        id: row.get(0)?,
        description: row.get(1)?,
        assistant: row.get(2)?,
        level: row.get(3)?,
        created_at,
    })
}
