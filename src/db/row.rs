//! Ordered column-to-value row mapping.

use crate::{Error, Result};
use rusqlite::types::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// An ordered sequence of rows, preserving the originating query's order.
pub type ResultSet = Vec<Row>;

/// One result row: an ordered mapping from column name to value.
///
/// All rows of a result set share one column header, captured from the
/// prepared statement before the first row is read. Serializing a row
/// emits a JSON object with keys in column order.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Extracts a row from a stepped `rusqlite` row.
    pub(crate) fn from_sql_row(columns: Arc<[String]>, row: &rusqlite::Row<'_>) -> Result<Self> {
        let mut values = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            let value = row.get_ref(index).map_err(|e| Error::StatementFailed {
                operation: "read_column".to_string(),
                cause: e.to_string(),
            })?;
            values.push(Value::from(value));
        }
        Ok(Self { columns, values })
    }

    /// The column names, in query order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Looks up a value by column name.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.values.get(index))
    }

    /// Looks up a value by position.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row holds no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(name, &json_value(value))?;
        }
        map.end()
    }
}

/// Converts a `SQLite` value into its JSON representation.
fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Value::from(*f),
        Value::Text(s) => serde_json::Value::from(s.clone()),
        Value::Blob(b) => serde_json::Value::from(b.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        let columns: Arc<[String]> = vec![
            "post_id".to_string(),
            "title".to_string(),
            "description".to_string(),
        ]
        .into();
        Row {
            columns,
            values: vec![
                Value::Integer(7),
                Value::Text("intro to rings".to_string()),
                Value::Null,
            ],
        }
    }

    #[test]
    fn test_get_by_name() {
        let row = sample_row();
        assert_eq!(row.get("post_id"), Some(&Value::Integer(7)));
        assert_eq!(row.get("description"), Some(&Value::Null));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_serialize_preserves_column_order() {
        let row = sample_row();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"post_id":7,"title":"intro to rings","description":null}"#
        );
    }

    #[test]
    fn test_value_at_positions() {
        let row = sample_row();
        assert_eq!(row.value_at(0), Some(&Value::Integer(7)));
        assert_eq!(row.value_at(3), None);
        assert_eq!(row.len(), 3);
    }
}
