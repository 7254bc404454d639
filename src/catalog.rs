//! Read-only schema introspection through each dialect's fixed catalog queries.

use crate::connection::DatabaseConnection;
use crate::dialect::Dialect;
use crate::error::SqlAntipathyError;
use crate::results::ResultSet;
use crate::types::SqlValue;

/// One column of a table as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

fn names(result: &ResultSet) -> Vec<String> {
    result
        .first_column()
        .into_iter()
        .filter(|value| !value.is_null())
        .map(|value| value.to_string())
        .collect()
}

fn nullable(value: Option<&SqlValue>) -> bool {
    match value {
        Some(SqlValue::Bool(b)) => *b,
        Some(SqlValue::Int(i)) => *i != 0,
        Some(SqlValue::Text(s)) => matches!(s.to_ascii_uppercase().as_str(), "YES" | "Y" | "TRUE" | "1"),
        _ => false,
    }
}

/// # Errors
///
/// Returns the backend error if the catalog query fails.
pub async fn show_databases(
    conn: &mut dyn DatabaseConnection,
    dialect: &dyn Dialect,
) -> Result<Vec<String>, SqlAntipathyError> {
    let result = conn.execute_select(&dialect.catalog().databases).await?;
    Ok(names(&result))
}

/// Tables of the current database or schema.
///
/// # Errors
///
/// Returns the backend error if the catalog query fails.
pub async fn show_tables(
    conn: &mut dyn DatabaseConnection,
    dialect: &dyn Dialect,
) -> Result<Vec<String>, SqlAntipathyError> {
    let result = conn.execute_select(&dialect.catalog().tables).await?;
    Ok(names(&result))
}

/// Columns of `table` in ordinal order.
///
/// # Errors
///
/// Returns the backend error if the catalog query fails.
pub async fn show_columns(
    conn: &mut dyn DatabaseConnection,
    dialect: &dyn Dialect,
    table: &str,
) -> Result<Vec<ColumnInfo>, SqlAntipathyError> {
    let result = conn.execute_select(&dialect.show_columns_query(table)).await?;
    Ok(result
        .iter()
        .map(|row| ColumnInfo {
            name: row.get_by_index(0).map(ToString::to_string).unwrap_or_default(),
            data_type: row.get_by_index(1).map(ToString::to_string).unwrap_or_default(),
            is_nullable: nullable(row.get_by_index(2)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_flags_across_engines() {
        assert!(nullable(Some(&SqlValue::from("YES"))));
        assert!(nullable(Some(&SqlValue::from("Y"))));
        assert!(!nullable(Some(&SqlValue::from("NO"))));
        assert!(!nullable(Some(&SqlValue::from("N"))));
        assert!(!nullable(None));
    }
}
