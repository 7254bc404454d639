use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::row::{ResultRow, index_columns};
use crate::error::SqlAntipathyError;
use crate::record::{Record, row_to_record};
use crate::types::SqlValue;

/// A result set from a database query
///
/// Holds the rows returned by a `SELECT` together with the column names reported by the
/// driver (the equivalent of a cursor description).
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<ResultRow>,
    /// The number of rows affected (for DML statements)
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index_cache: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
            column_index_cache: None,
        }
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index_cache = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set.
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ExecutionError` if column names were never set or the
    /// row width does not match them.
    pub fn add_row_values(&mut self, values: Vec<SqlValue>) -> Result<(), SqlAntipathyError> {
        let (Some(column_names), Some(cache)) = (&self.column_names, &self.column_index_cache)
        else {
            return Err(SqlAntipathyError::ExecutionError(
                "No column names available".to_string(),
            ));
        };
        if values.len() != column_names.len() {
            return Err(SqlAntipathyError::ExecutionError(format!(
                "row has {} values but the result set has {} columns",
                values.len(),
                column_names.len()
            )));
        }

        self.results.push(ResultRow {
            column_names: Arc::clone(column_names),
            values,
            column_index_cache: Arc::clone(cache),
        });
        self.rows_affected += 1;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.results.iter()
    }

    /// First column of every row, the shape catalog queries return.
    #[must_use]
    pub fn first_column(&self) -> Vec<SqlValue> {
        self.results
            .iter()
            .filter_map(|row| row.get_by_index(0).cloned())
            .collect()
    }

    /// Pair every row with the column names, decoding `json_fields` on the way.
    ///
    /// # Errors
    ///
    /// Returns `SqlAntipathyError::ParseError` if a designated JSON column holds invalid JSON.
    pub fn into_records(self, json_fields: &HashSet<String>) -> Result<Vec<Record>, SqlAntipathyError> {
        let Some(column_names) = self.column_names else {
            return Ok(Vec::new());
        };
        self.results
            .into_iter()
            .map(|row| row_to_record(column_names.as_slice(), row.values, json_fields))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(cols: &[&str]) -> Arc<Vec<String>> {
        Arc::new(cols.iter().map(|c| (*c).to_string()).collect())
    }

    #[test]
    fn rows_share_column_lookup() {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_column_names(names(&["id", "name"]));
        rs.add_row_values(vec![SqlValue::Int(1), SqlValue::Text("a".into())])
            .unwrap();
        rs.add_row_values(vec![SqlValue::Int(2), SqlValue::Null]).unwrap();

        assert_eq!(rs.len(), 2);
        assert_eq!(rs.results[1].get("id"), Some(&SqlValue::Int(2)));
        assert_eq!(rs.results[0].get("missing"), None);
        assert_eq!(rs.first_column(), vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn rejects_rows_without_columns_or_wrong_width() {
        let mut rs = ResultSet::default();
        assert!(rs.add_row_values(vec![SqlValue::Null]).is_err());
        rs.set_column_names(names(&["a", "b"]));
        assert!(rs.add_row_values(vec![SqlValue::Null]).is_err());
    }
}
