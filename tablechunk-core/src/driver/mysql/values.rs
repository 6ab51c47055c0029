//! MySQL row to JSON conversion.

use crate::driver::Row;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;
use sqlx::{Column as _, Row as _, TypeInfo as _};
use sqlx::mysql::MySqlRow;

/// Converts every column of a row, in select-list order.
pub(super) fn row_to_values(row: &MySqlRow) -> Row {
    (0..row.len()).map(|index| extract_value(row, index)).collect()
}

/// Extracts one column value as JSON.
///
/// Types are tried in order of likelihood. Binary values that are valid UTF-8
/// (`SHOW TABLES` returns those on some servers) become strings; other binary
/// values become base64. Types with no JSON mapping decode as null.
fn extract_value(row: &MySqlRow, index: usize) -> JsonValue {
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map(JsonValue::String).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(index) {
        return v.map(JsonValue::from).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(index) {
        return v
            .and_then(|f| serde_json::Number::from_f64(f64::from(f)))
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map(JsonValue::Bool).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(index) {
        return v
            .map(|dt| JsonValue::String(dt.to_string()))
            .unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(index) {
        return v
            .map(|d| JsonValue::String(d.to_string()))
            .unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(index) {
        return v
            .map(|t| JsonValue::String(t.to_string()))
            .unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return v.map(bytes_to_json).unwrap_or(JsonValue::Null);
    }

    // DECIMAL, JSON, SET and friends have no checked mapping, but the text
    // protocol still delivers them as text.
    let type_name = row.column(index).type_info().name();
    if let Ok(v) = row.try_get_unchecked::<Option<String>, _>(index) {
        return v
            .map(|text| text_to_json(type_name, text))
            .unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get_unchecked::<Option<Vec<u8>>, _>(index) {
        return v.map(bytes_to_json).unwrap_or(JsonValue::Null);
    }

    tracing::warn!(
        "No JSON mapping for column {} of type {}, using null",
        index,
        type_name
    );
    JsonValue::Null
}

/// Text of a column no typed getter could decode. JSON columns are
/// parsed; everything else, DECIMAL included, stays a string so no
/// precision is lost.
fn text_to_json(type_name: &str, text: String) -> JsonValue {
    if type_name.eq_ignore_ascii_case("JSON")
        && let Ok(value) = serde_json::from_str(&text)
    {
        return value;
    }
    JsonValue::String(text)
}

fn bytes_to_json(bytes: Vec<u8>) -> JsonValue {
    match String::from_utf8(bytes) {
        Ok(text) => JsonValue::String(text),
        Err(e) => JsonValue::String(BASE64.encode(e.into_bytes())),
    }
}
