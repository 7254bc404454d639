use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::ValueRef;

use crate::error::SqlAntipathyError;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// Extract a `SqlValue` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlAntipathyError` if the column index is out of range.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<SqlValue, SqlAntipathyError> {
    let value = row.get_ref(idx)?;
    Ok(match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Int(i),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    })
}

/// Run a prepared query and collect every row.
///
/// # Errors
///
/// Returns `SqlAntipathyError::SqliteError` if stepping the statement fails.
pub fn build_result_set(stmt: &mut Statement<'_>) -> Result<ResultSet, SqlAntipathyError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows_iter = stmt.query([])?;
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value_sync(row, i)?);
        }
        result_set.add_row_values(row_values)?;
    }

    Ok(result_set)
}
