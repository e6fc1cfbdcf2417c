use crate::error::{Result, TelemetryError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Raw query response: `{"tables": [{"name", "columns", "rows"}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub tables: Vec<QueryTable>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: String,
}

/// One result table with positional rows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryTable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl QueryResponse {
    /// The primary result table; an empty table when the backend returned none.
    pub fn into_primary(self) -> QueryTable {
        self.tables.into_iter().next().unwrap_or_default()
    }
}

impl QueryTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Resolves the given column names to positions, failing on the first absent one.
    pub fn require_columns<const N: usize>(&self, names: [&str; N]) -> Result<[usize; N]> {
        let mut out = [0usize; N];
        for (slot, name) in out.iter_mut().zip(names) {
            *slot = self
                .column_index(name)
                .ok_or_else(|| TelemetryError::Decode(format!("missing column '{name}'")))?;
        }
        Ok(out)
    }
}

pub(crate) fn cell<'a>(row: &'a [Value], idx: usize) -> &'a Value {
    row.get(idx).unwrap_or(&Value::Null)
}

pub(crate) fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Text cells tolerate numbers (result codes) and nulls.
pub(crate) fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primary_table_of_empty_response_is_empty() {
        let resp: QueryResponse = serde_json::from_value(json!({ "tables": [] })).unwrap();
        assert!(resp.into_primary().is_empty());
    }

    #[test]
    fn require_columns_reports_missing_name() {
        let table: QueryTable = serde_json::from_value(json!({
            "name": "PrimaryResult",
            "columns": [{ "name": "timestamp", "type": "datetime" }],
            "rows": []
        }))
        .unwrap();
        assert_eq!(table.require_columns(["timestamp"]).unwrap(), [0]);
        let err = table.require_columns(["timestamp", "duration"]).unwrap_err();
        assert!(err.to_string().contains("duration"));
    }

    #[test]
    fn cell_conversions_are_lenient() {
        assert_eq!(as_f64(&json!("12.5")), Some(12.5));
        assert_eq!(as_bool(&json!("False")), Some(false));
        assert_eq!(as_text(&json!(404)), "404");
        assert_eq!(as_text(&Value::Null), "");
        assert!(as_timestamp(&json!("2024-03-01T10:00:00.123Z")).is_some());
        assert!(as_timestamp(&json!("yesterday")).is_none());
    }
}
