use std::collections::HashSet;

use serde_json::{Map, Value as JsonValue};

use crate::error::SqlAntipathyError;
use crate::types::SqlValue;

/// An ordered column-name to value mapping.
///
/// Insertion order is kept because it becomes the column order of statements built from
/// the record when no explicit column list is supplied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, SqlValue)>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Set `column` to `value`, replacing in place if the column already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Builder-style [`Record::insert`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(column, value);
        self
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy of the record without the fields whose value equals `value`.
    #[must_use]
    pub fn without_value(&self, value: &SqlValue) -> Record {
        self.fields
            .iter()
            .filter(|(_, v)| v != value)
            .cloned()
            .collect()
    }

    /// The record as a JSON object, keys in column order.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, SqlValue);
    type IntoIter = std::vec::IntoIter<(String, SqlValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Zip positional row values with their column names.
///
/// Columns listed in `json_fields` are decoded from their string form; every other
/// value passes through untouched. Extra values or names beyond the shorter side are
/// dropped, as with a plain zip. A repeated column name keeps its first position and its
/// last value.
///
/// # Errors
///
/// Returns `SqlAntipathyError::ParseError` if a designated JSON column is not valid JSON
/// or is not a string.
pub fn row_to_record<S: AsRef<str>>(
    column_names: &[S],
    row_values: Vec<SqlValue>,
    json_fields: &HashSet<String>,
) -> Result<Record, SqlAntipathyError> {
    let mut record = Record::with_capacity(column_names.len());
    for (name, value) in column_names.iter().zip(row_values) {
        let name = name.as_ref();
        let value = if json_fields.contains(name) {
            decode_json_field(name, value)?
        } else {
            value
        };
        record.insert(name, value);
    }
    Ok(record)
}

fn decode_json_field(column: &str, value: SqlValue) -> Result<SqlValue, SqlAntipathyError> {
    let parse = |text: &str| {
        serde_json::from_str::<JsonValue>(text)
            .map(SqlValue::Json)
            .map_err(|e| SqlAntipathyError::ParseError {
                column: column.to_string(),
                message: e.to_string(),
            })
    };
    match value {
        SqlValue::Null | SqlValue::Json(_) => Ok(value),
        SqlValue::Text(text) => parse(&text),
        SqlValue::Blob(bytes) => match std::str::from_utf8(&bytes) {
            Ok(text) => parse(text),
            Err(e) => Err(SqlAntipathyError::ParseError {
                column: column.to_string(),
                message: format!("not UTF-8: {e}"),
            }),
        },
        other => Err(SqlAntipathyError::ParseError {
            column: column.to_string(),
            message: format!("expected a JSON string, found {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn zips_in_column_order() {
        let rec = row_to_record(
            &["id", "name"],
            vec![SqlValue::Int(7), SqlValue::Text("x".into())],
            &HashSet::new(),
        )
        .unwrap();
        assert_eq!(rec.columns().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(rec.get("id"), Some(&SqlValue::Int(7)));
    }

    #[test]
    fn repeated_column_keeps_the_last_value() {
        let rec = row_to_record(
            &["a", "b", "a"],
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)],
            &HashSet::new(),
        )
        .unwrap();
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(rec.get("a"), Some(&SqlValue::Int(3)));
    }

    #[test]
    fn decodes_designated_json_columns_only() {
        let rec = row_to_record(
            &["meta", "raw"],
            vec![
                SqlValue::Text(r#"{"a":[1,2]}"#.into()),
                SqlValue::Text(r#"{"a":[1,2]}"#.into()),
            ],
            &set(&["meta"]),
        )
        .unwrap();
        assert_eq!(rec.get("meta"), Some(&SqlValue::Json(json!({"a": [1, 2]}))));
        assert_eq!(rec.get("raw"), Some(&SqlValue::Text(r#"{"a":[1,2]}"#.into())));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = row_to_record(&["meta"], vec![SqlValue::Text("{nope".into())], &set(&["meta"]))
            .unwrap_err();
        match err {
            SqlAntipathyError::ParseError { column, .. } => assert_eq!(column, "meta"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn null_json_column_stays_null() {
        let rec = row_to_record(&["meta"], vec![SqlValue::Null], &set(&["meta"])).unwrap();
        assert_eq!(rec.get("meta"), Some(&SqlValue::Null));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut rec = Record::new().with("a", 1).with("b", 2);
        rec.insert("a", 3);
        assert_eq!(rec.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(rec.get("a"), Some(&SqlValue::Int(3)));
    }

    #[test]
    fn without_value_drops_sentinel_fields() {
        let rec = Record::new()
            .with("a", "keep")
            .with("b", "n/a")
            .with("c", "n/a");
        let cleaned = rec.without_value(&SqlValue::from("n/a"));
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.to_json(), json!({"a": "keep"}));
    }
}
