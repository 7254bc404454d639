//! Literal escaping and value decoding shared by every dialect.
//!
//! Statements built here embed values as SQL text rather than bound parameters. The
//! cleaning below keeps those literals well delimited but is not a defence against
//! hostile input; callers own that exposure.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike};
use regex::Regex;

use crate::dialect::Dialect;
use crate::error::SqlAntipathyError;
use crate::record::Record;
use crate::types::{SqlValue, hex};

/// The SQL `NULL` literal.
pub const NULL_LITERAL: &str = "NULL";

// Double quotes, runs of backslashes (optionally after a colon) and forward slashes.
static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""+|:?\\+|/"#).unwrap_or_else(|e| panic!("invalid cleaning pattern: {e}"))
});

/// True for the values every dialect writes as `NULL`: null, empty text, the text
/// `"NULL"` and NaN.
#[must_use]
pub fn is_null_like(value: &SqlValue) -> bool {
    match value {
        SqlValue::Null => true,
        SqlValue::Float(f) => f.is_nan(),
        SqlValue::Text(s) => s.is_empty() || s == NULL_LITERAL,
        _ => false,
    }
}

/// Strip quote characters, backslashes and slashes, trim, then double single quotes.
#[must_use]
pub fn clean_text(text: &str) -> String {
    UNSAFE_CHARS.replace_all(text, "").trim().replace('\'', "''")
}

/// Wrap already-escaped text in single quotes.
#[must_use]
pub fn quote(escaped: &str) -> String {
    format!("'{escaped}'")
}

/// Render a value as a literal that can be pasted into statement text.
///
/// Null-like values become `NULL`, text is cleaned, and every other scalar is quoted in its
/// `Display` form, so booleans go in as `'1'` and `'0'` rather than `'true'`/`'false'`.
///
/// ```rust
/// use sql_antipathy::prelude::*;
///
/// assert_eq!(scalar_to_sql_literal(&SqlValue::Null), "NULL");
/// assert_eq!(scalar_to_sql_literal(&SqlValue::from("O'Brien")), "'O''Brien'");
/// assert_eq!(scalar_to_sql_literal(&SqlValue::Int(42)), "'42'");
/// assert_eq!(scalar_to_sql_literal(&SqlValue::Bool(true)), "'1'");
/// ```
#[must_use]
pub fn scalar_to_sql_literal(value: &SqlValue) -> String {
    if is_null_like(value) {
        return NULL_LITERAL.to_string();
    }
    match value {
        SqlValue::Text(s) => quote(&clean_text(s)),
        // JSON keeps its own quoting; only the delimiter needs doubling.
        SqlValue::Json(json) => quote(&json.to_string().replace('\'', "''")),
        SqlValue::Blob(bytes) => format!("X'{}'", hex(bytes)),
        other => quote(&other.to_string()),
    }
}

/// Column list and value list for one record, both `", "` separated.
///
/// `columns` defaults to the record's own columns; columns the record lacks render
/// `missing_value`.
#[must_use]
pub fn make_list_of_values<S: AsRef<str>>(
    dialect: &dyn Dialect,
    record: &Record,
    columns: Option<&[S]>,
    missing_value: &SqlValue,
) -> (String, String) {
    let names: Vec<&str> = match columns {
        Some(cols) => cols.iter().map(AsRef::as_ref).collect(),
        None => record.columns().collect(),
    };
    let values: Vec<String> = names
        .iter()
        .map(|name| dialect.escape_literal(record.get(name).unwrap_or(missing_value)))
        .collect();
    (names.join(", "), values.join(", "))
}

/// Byte length of an ODBC `SQL_SS_TIMESTAMPOFFSET_STRUCT`.
pub const DATETIME_OFFSET_LEN: usize = 20;

/// Decode the raw `datetimeoffset` structure SQL Server drivers hand out when no
/// converter is installed: little-endian `year, month, day, hour, minute, second`
/// (16-bit each), `fraction` in nanoseconds (32-bit), then the offset hour and minute.
/// The fraction is truncated to microseconds.
///
/// # Errors
///
/// Returns `SqlAntipathyError::ParseError` if the buffer has the wrong length or holds an
/// impossible date, time or offset.
pub fn decode_datetime_offset(bytes: &[u8]) -> Result<DateTime<FixedOffset>, SqlAntipathyError> {
    let bad = |message: String| SqlAntipathyError::ParseError {
        column: "datetimeoffset".to_string(),
        message,
    };
    if bytes.len() != DATETIME_OFFSET_LEN {
        return Err(bad(format!(
            "expected {DATETIME_OFFSET_LEN} bytes, found {}",
            bytes.len()
        )));
    }
    let word = |i: usize| i16::from_le_bytes([bytes[i], bytes[i + 1]]);
    let (year, month, day) = (word(0), word(2), word(4));
    let (hour, minute, second) = (word(6), word(8), word(10));
    let fraction = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    let (tz_hour, tz_minute) = (word(16), word(18));

    let to_u32 = |v: i16| u32::try_from(v).map_err(|_| bad(format!("negative field {v}")));
    let date = NaiveDate::from_ymd_opt(i32::from(year), to_u32(month)?, to_u32(day)?)
        .ok_or_else(|| bad(format!("invalid date {year}-{month}-{day}")))?;
    let naive = date
        .and_hms_micro_opt(to_u32(hour)?, to_u32(minute)?, to_u32(second)?, fraction / 1000)
        .ok_or_else(|| bad(format!("invalid time {hour}:{minute}:{second}")))?;
    let offset_secs = i32::from(tz_hour) * 3600 + i32::from(tz_minute) * 60;
    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| bad(format!("invalid offset {tz_hour}:{tz_minute}")))?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| bad("ambiguous local time".to_string()))
}

/// Inverse of [`decode_datetime_offset`].
#[must_use]
pub fn encode_datetime_offset(value: &DateTime<FixedOffset>) -> Vec<u8> {
    let local = value.naive_local();
    let offset_minutes = value.offset().local_minus_utc() / 60;
    let clamp = |v: i64| i16::try_from(v).unwrap_or(i16::MAX);

    let mut out = Vec::with_capacity(DATETIME_OFFSET_LEN);
    for field in [
        i64::from(local.year()),
        i64::from(local.month()),
        i64::from(local.day()),
        i64::from(local.hour()),
        i64::from(local.minute()),
        i64::from(local.second()),
    ] {
        out.extend_from_slice(&clamp(field).to_le_bytes());
    }
    // Sub-microsecond precision is not representable after decoding anyway.
    let fraction = local.nanosecond() % 1_000_000_000 / 1000 * 1000;
    out.extend_from_slice(&fraction.to_le_bytes());
    out.extend_from_slice(&clamp(i64::from(offset_minutes / 60)).to_le_bytes());
    out.extend_from_slice(&clamp(i64::from(offset_minutes % 60)).to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MssqlDialect;

    #[test]
    fn null_like_values_become_null() {
        for value in [
            SqlValue::Null,
            SqlValue::Text(String::new()),
            SqlValue::Text("NULL".into()),
            SqlValue::Float(f64::NAN),
        ] {
            assert_eq!(scalar_to_sql_literal(&value), "NULL", "{value:?}");
        }
    }

    #[test]
    fn text_is_cleaned_then_quoted() {
        assert_eq!(
            scalar_to_sql_literal(&SqlValue::from(r#" say "hi" to C:\temp/dir "#)),
            "'say hi to Ctempdir'"
        );
        assert_eq!(scalar_to_sql_literal(&SqlValue::from("it's")), "'it''s'");
        assert_eq!(scalar_to_sql_literal(&SqlValue::from("''")), "''''''");
    }

    #[test]
    fn other_scalars_are_stringified_and_quoted() {
        assert_eq!(scalar_to_sql_literal(&SqlValue::Float(1.5)), "'1.5'");
        assert_eq!(scalar_to_sql_literal(&SqlValue::Bool(false)), "'0'");
        assert_eq!(scalar_to_sql_literal(&SqlValue::Blob(vec![1, 255])), "X'01FF'");
        assert_eq!(
            scalar_to_sql_literal(&SqlValue::Json(serde_json::json!({"k": "it's"}))),
            r#"'{"k":"it''s"}'"#
        );
    }

    #[test]
    fn list_of_values_fills_missing_columns() {
        let record = Record::new().with("a", 1).with("b", "x");
        let cols = ["b".to_string(), "c".to_string(), "a".to_string()];
        let (names, values) =
            make_list_of_values(&MssqlDialect::default(), &record, Some(&cols[..]), &SqlValue::Null);
        assert_eq!(names, "b, c, a");
        assert_eq!(values, "'x', NULL, '1'");

        let (names, _) =
            make_list_of_values::<&str>(&MssqlDialect::default(), &record, None, &SqlValue::Null);
        assert_eq!(names, "a, b");
    }

    #[test]
    fn datetime_offset_structure_decodes() {
        // 2017-03-16 10:35:18.5 -06:00
        let mut raw = Vec::new();
        for v in [2017i16, 3, 16, 10, 35, 18] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        raw.extend_from_slice(&500_000_000u32.to_le_bytes());
        raw.extend_from_slice(&(-6i16).to_le_bytes());
        raw.extend_from_slice(&0i16.to_le_bytes());

        let decoded = decode_datetime_offset(&raw).unwrap();
        assert_eq!(decoded.to_rfc3339(), "2017-03-16T10:35:18.500-06:00");
        assert_eq!(encode_datetime_offset(&decoded), raw);
    }

    #[test]
    fn datetime_offset_rejects_bad_buffers() {
        assert!(decode_datetime_offset(&[0u8; 4]).is_err());
        let mut raw = vec![0u8; DATETIME_OFFSET_LEN];
        raw[2] = 13; // month 13
        assert!(decode_datetime_offset(&raw).is_err());
    }
}
