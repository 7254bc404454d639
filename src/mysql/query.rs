use std::sync::Arc;

use chrono::NaiveDateTime;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Executor, Row, TypeInfo, ValueRef};

use crate::error::SqlAntipathyError;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// Run `query` and collect every row.
///
/// Plain string queries go over the text protocol, so session statements and
/// transactions behave as they would in the `mysql` client.
///
/// # Errors
/// Returns `SqlAntipathyError::MysqlError` if the query fails or a value cannot be decoded.
pub async fn build_result_set(
    conn: &mut MySqlConnection,
    query: &str,
) -> Result<ResultSet, SqlAntipathyError> {
    let rows = (&mut *conn).fetch_all(query).await?;

    let column_names: Vec<String> = match rows.first() {
        Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        None => (&mut *conn)
            .describe(query)
            .await?
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
    };

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));
    for row in &rows {
        let mut row_values = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            row_values.push(extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values)?;
    }
    Ok(result_set)
}

/// Decode one column by its reported MySQL type name.
fn extract_value(row: &MySqlRow, idx: usize) -> Result<SqlValue, SqlAntipathyError> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = row.columns()[idx].type_info().name();

    let value = match type_name {
        "BOOLEAN" => SqlValue::Bool(row.try_get_unchecked::<bool, _>(idx)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            SqlValue::Int(row.try_get_unchecked::<i64, _>(idx)?)
        }
        name if name.ends_with(" UNSIGNED") => {
            let unsigned = row.try_get_unchecked::<u64, _>(idx)?;
            i64::try_from(unsigned).map_or_else(
                |_| SqlValue::Text(unsigned.to_string()),
                SqlValue::Int,
            )
        }
        "FLOAT" | "DOUBLE" => SqlValue::Float(row.try_get_unchecked::<f64, _>(idx)?),
        "DECIMAL" => {
            let text = row.try_get_unchecked::<String, _>(idx)?;
            text.parse::<f64>()
                .map_or(SqlValue::Text(text), SqlValue::Float)
        }
        "DATETIME" | "TIMESTAMP" => {
            SqlValue::Timestamp(row.try_get_unchecked::<NaiveDateTime, _>(idx)?)
        }
        "JSON" => {
            let text = row.try_get_unchecked::<String, _>(idx)?;
            match serde_json::from_str(&text) {
                Ok(json) => SqlValue::Json(json),
                Err(_) => SqlValue::Text(text),
            }
        }
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => SqlValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => SqlValue::Text(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}
