//! Database schema and types

use crate::domain::{format_date, Assistant, AssistantFilter, Level};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT,
    assistant TEXT,
    level INTEGER,
    created_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_records_created_at ON records(created_at);
";

/// One stored incident report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub description: String,
    pub assistant: Assistant,
    pub level: Level,
    pub created_at: NaiveDate,
}

/// Fields collected by the intake wizard; the store adds `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub description: String,
    pub assistant: Assistant,
    pub level: Level,
}

/// Filter for an export: inclusive date range plus assistant restriction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub filter: AssistantFilter,
}

impl RecordQuery {
    /// In-memory equivalent of the SQL predicate
    #[cfg(test)]
    pub fn matches(&self, record: &Record) -> bool {
        self.date_from <= record.created_at
            && record.created_at <= self.date_to
            && self.filter.matches(&record.assistant)
    }
}

// ============================================================================
// Column conversions
// ============================================================================

impl ToSql for Level {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_i64()))
    }
}

impl FromSql for Level {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        Level::from_i64(raw).ok_or(FromSqlError::OutOfRange(raw))
    }
}

impl ToSql for Assistant {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Assistant {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Assistant::from_stored)
    }
}

/// Dates are stored as fixed-width `YYYY-MM-DD` text so that string
/// comparison in SQL matches calendar order.
pub(crate) fn date_to_sql(date: NaiveDate) -> String {
    format_date(date)
}

pub(crate) fn date_from_sql(value: ValueRef<'_>) -> FromSqlResult<NaiveDate> {
    let text = value.as_str()?;
    crate::domain::parse_date(text).map_err(|e| FromSqlError::Other(Box::new(e)))
}
