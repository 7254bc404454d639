use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures_util::TryStreamExt;
use tiberius::{ColumnData, FromSql, QueryItem};

use super::client::MssqlClient;
use crate::codec::encode_datetime_offset;
use crate::error::SqlAntipathyError;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// Run `query` as a plain batch and collect the first result set.
///
/// Batches sent this way keep session state (`USE`, `SET`) alive for the connection.
/// With `datetime_converter` off, `datetimeoffset` columns come back as their raw
/// 20-byte structure instead of a zoned timestamp.
///
/// # Errors
/// Returns `SqlAntipathyError::MssqlError` if the query or row streaming fails.
pub async fn build_result_set(
    client: &mut MssqlClient,
    query: &str,
    datetime_converter: bool,
) -> Result<ResultSet, SqlAntipathyError> {
    let mut stream = client.simple_query(query).await?;
    let mut result_set = ResultSet::with_capacity(10);

    while let Some(item) = stream.try_next().await? {
        match item {
            QueryItem::Metadata(meta) if meta.result_index() == 0 => {
                let column_names: Vec<String> =
                    meta.columns().iter().map(|col| col.name().to_string()).collect();
                result_set.set_column_names(Arc::new(column_names));
            }
            QueryItem::Row(row) if row.result_index() == 0 => {
                let mut row_values = Vec::with_capacity(row.len());
                for (_, data) in row.cells() {
                    row_values.push(extract_value(data, datetime_converter)?);
                }
                result_set.add_row_values(row_values)?;
            }
            _ => {}
        }
    }

    if result_set.get_column_names().is_none() {
        result_set.set_column_names(Arc::new(Vec::new()));
    }
    Ok(result_set)
}

fn decode<'a, T: FromSql<'a>>(data: &'a ColumnData<'static>) -> Result<Option<T>, SqlAntipathyError> {
    Ok(T::from_sql(data)?)
}

/// Map one Tiberius cell to a `SqlValue`.
fn extract_value(
    data: &ColumnData<'static>,
    datetime_converter: bool,
) -> Result<SqlValue, SqlAntipathyError> {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| SqlValue::Int(i64::from(v))),
        ColumnData::I16(v) => v.map(|v| SqlValue::Int(i64::from(v))),
        ColumnData::I32(v) => v.map(|v| SqlValue::Int(i64::from(v))),
        ColumnData::I64(v) => v.map(SqlValue::Int),
        ColumnData::F32(v) => v.map(|v| SqlValue::Float(f64::from(v))),
        ColumnData::F64(v) => v.map(SqlValue::Float),
        ColumnData::Bit(v) => v.map(SqlValue::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| SqlValue::Text(s.to_string())),
        ColumnData::Guid(v) => v.map(|g| SqlValue::Text(g.to_string())),
        ColumnData::Binary(v) => v.as_ref().map(|b| SqlValue::Blob(b.to_vec())),
        ColumnData::Numeric(v) => v.map(|n| SqlValue::Float(f64::from(n))),
        ColumnData::Xml(v) => v.as_ref().map(|x| SqlValue::Text(x.to_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            decode::<NaiveDateTime>(data)?.map(SqlValue::Timestamp)
        }
        ColumnData::Date(_) => {
            decode::<NaiveDate>(data)?.map(|d| SqlValue::Text(d.format("%Y-%m-%d").to_string()))
        }
        ColumnData::Time(_) => decode::<NaiveTime>(data)?.map(|t| SqlValue::Text(t.to_string())),
        ColumnData::DateTimeOffset(_) => {
            decode::<DateTime<FixedOffset>>(data)?.map(|dt| {
                if datetime_converter {
                    SqlValue::TimestampTz(dt)
                } else {
                    SqlValue::Blob(encode_datetime_offset(&dt))
                }
            })
        }
    };
    Ok(value.unwrap_or(SqlValue::Null))
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn integers_widen_and_nulls_stay_null() {
        assert_eq!(extract_value(&ColumnData::U8(Some(7)), true).unwrap(), SqlValue::Int(7));
        assert_eq!(extract_value(&ColumnData::I16(Some(-3)), true).unwrap(), SqlValue::Int(-3));
        assert_eq!(extract_value(&ColumnData::I32(None), true).unwrap(), SqlValue::Null);
        assert_eq!(
            extract_value(&ColumnData::String(Some(Cow::Borrowed("abc"))), true).unwrap(),
            SqlValue::Text("abc".into())
        );
    }
}
