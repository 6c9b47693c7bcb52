//! Spreadsheet export of incident records
//!
//! Pure formatting: rows are written in the order supplied, nothing is
//! filtered here.

use crate::db::Record;
use crate::domain::format_date;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

pub const EXPORT_HEADER: [&str; 5] = ["ID", "Date", "Assistant", "Level", "Description"];
pub const EXPORT_FILENAME: &str = "export.xlsx";
pub const XLSX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to build spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("Too many rows for one worksheet: {0}")]
    TooManyRows(usize),
}

/// A rendered document ready to hand to the message gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
    /// Data rows, excluding the header
    pub row_count: usize,
}

/// One exported row in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub id: i64,
    pub date: String,
    pub assistant: String,
    pub level: i64,
    pub description: String,
}

impl From<&Record> for ExportRow {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id,
            date: format_date(record.created_at),
            assistant: record.assistant.to_string(),
            level: record.level.as_i64(),
            description: record.description.clone(),
        }
    }
}

/// Tabular content of an export, before encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub header: [&'static str; 5],
    pub rows: Vec<ExportRow>,
}

impl ExportTable {
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            header: EXPORT_HEADER,
            rows: records.iter().map(ExportRow::from).collect(),
        }
    }
}

/// Render records into an `.xlsx` workbook
#[allow(clippy::cast_precision_loss)] // record ids and levels are far below 2^53
pub fn render_workbook(records: &[Record]) -> Result<ExportDocument, ExportError> {
    let table = ExportTable::from_records(records);
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, title) in (0u16..).zip(table.header) {
        sheet.write_string_with_format(0, col, title, &bold)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let line = u32::try_from(index + 1).map_err(|_| ExportError::TooManyRows(records.len()))?;
        sheet.write_number(line, 0, row.id as f64)?;
        sheet.write_string(line, 1, &row.date)?;
        sheet.write_string(line, 2, &row.assistant)?;
        sheet.write_number(line, 3, row.level as f64)?;
        sheet.write_string(line, 4, &row.description)?;
    }

    sheet.set_column_width(1, 12)?;
    sheet.set_column_width(2, 16)?;
    sheet.set_column_width(4, 60)?;

    let bytes = workbook.save_to_buffer()?;
    Ok(ExportDocument {
        filename: EXPORT_FILENAME.to_string(),
        media_type: XLSX_MEDIA_TYPE.to_string(),
        bytes,
        row_count: table.rows.len(),
    })
}
