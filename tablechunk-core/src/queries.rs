//! Statement text and the small fetch helpers built on it.
//!
//! # Trust boundary
//! Table and column names are interpolated into statement text verbatim.
//! Nothing is quoted or escaped; callers must only pass trusted names.

use crate::driver::{Cursor, Row};
use crate::error::TableChunkError;
use crate::Result;
use serde_json::Value as JsonValue;

/// Lists every table in the current database.
pub const SHOW_TABLES: &str = "SHOW TABLES;";

pub fn count_rows_sql(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {};", table)
}

pub fn show_columns_sql(table: &str) -> String {
    format!("SHOW COLUMNS FROM {};", table)
}

/// `LIMIT start,size`: skip `start` rows, return at most `size`.
pub fn select_range_sql(table: &str, columns: &[String], start: u64, size: u64) -> String {
    format!(
        "SELECT {} FROM {} LIMIT {},{};",
        select_list(columns),
        table,
        start,
        size
    )
}

pub fn create_randomized_sql(source: &str, dest: &str, columns: &[String]) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} AS SELECT {} FROM {} ORDER BY RAND();",
        dest,
        select_list(columns),
        source
    )
}

/// An empty column list selects everything.
fn select_list(columns: &[String]) -> String {
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    }
}

/// True when `columns` means "all columns" and labels must come from the table.
pub fn selects_all(columns: &[String]) -> bool {
    columns.is_empty() || columns.iter().any(|c| c == "*")
}

pub async fn list_tables(cursor: &dyn Cursor) -> Result<Vec<String>> {
    let rows = cursor.fetch_all(SHOW_TABLES).await?;
    rows.iter().map(|row| first_text(row, SHOW_TABLES)).collect()
}

pub async fn count_rows(cursor: &dyn Cursor, table: &str) -> Result<u64> {
    let sql = count_rows_sql(table);
    let rows = cursor.fetch_all(&sql).await?;
    let value = rows
        .first()
        .and_then(|row| row.first())
        .ok_or_else(|| TableChunkError::decode(format!("'{}' returned no rows", sql)))?;
    as_count(value).ok_or_else(|| {
        TableChunkError::decode(format!("'{}' returned a non-integer count: {}", sql, value))
    })
}

pub async fn list_columns(cursor: &dyn Cursor, table: &str) -> Result<Vec<String>> {
    let sql = show_columns_sql(table);
    let rows = cursor.fetch_all(&sql).await?;
    rows.iter().map(|row| first_text(row, &sql)).collect()
}

pub async fn fetch_range(
    cursor: &dyn Cursor,
    table: &str,
    columns: &[String],
    start: u64,
    size: u64,
) -> Result<Vec<Row>> {
    cursor
        .fetch_all(&select_range_sql(table, columns, start, size))
        .await
}

fn first_text(row: &Row, sql: &str) -> Result<String> {
    match row.first() {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(TableChunkError::decode(format!(
            "'{}' returned an empty row",
            sql
        ))),
    }
}

fn as_count(value: &JsonValue) -> Option<u64> {
    match value {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
