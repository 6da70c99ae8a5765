use chrono::NaiveDateTime;
use tracing::debug;

use crate::table::{column::Column, month::Month, table::Table, TableError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Splits a combined `YYYY-MM-DD HH:MM:SS` text column into a date column
/// and a time column.
///
/// Both outputs are exact substrings of the input, so `date + " " + time`
/// reproduces the original text. Every row must parse; a malformed or null
/// value aborts the whole operation.
pub fn split_timestamp(
    table: &Table,
    source: &str,
    date_col: &str,
    time_col: &str,
) -> Result<Table, TableError> {
    let col = table.column(source)?;
    let mut dates: Vec<Option<String>> = Vec::with_capacity(table.row_count());
    let mut times: Vec<Option<String>> = Vec::with_capacity(table.row_count());

    for (row, cell) in col.iter_str().enumerate() {
        let text = cell.ok_or_else(|| {
            TableError::Parse(format!("column '{}': null timestamp at row {}", source, row))
        })?;
        NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).map_err(|e| {
            TableError::Parse(format!("column '{}': '{}': {}", source, text, e))
        })?;
        // Format is validated above, so the space split is total
        let (date, time) = text.split_once(' ').ok_or_else(|| {
            TableError::Parse(format!("column '{}': '{}': missing separator", source, text))
        })?;
        dates.push(Some(date.to_string()));
        times.push(Some(time.to_string()));
    }

    debug!(source, rows = table.row_count(), "split timestamp column");

    table
        .with_column(date_col, Column::Str(dates))?
        .with_column(time_col, Column::Str(times))
}

/// Adds a three-letter month label column derived from a `YYYY-MM-DD` date
/// column. Labels come from the fixed [`Month`] vocabulary.
pub fn add_month_label(table: &Table, date_col: &str, label_col: &str) -> Result<Table, TableError> {
    let col = table.column(date_col)?;
    let mut labels: Vec<Option<String>> = Vec::with_capacity(table.row_count());

    for (row, cell) in col.iter_str().enumerate() {
        let text = cell.ok_or_else(|| {
            TableError::Parse(format!("column '{}': null date at row {}", date_col, row))
        })?;
        let date = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| {
            TableError::Parse(format!("column '{}': '{}': {}", date_col, text, e))
        })?;
        labels.push(Some(Month::from_date(date).abbrev().to_string()));
    }

    table.with_column(label_col, Column::Str(labels))
}
