use serde::Serialize;
use serde_json::Value;

use libreforms_common::Document;

/// Rows of stored documents shaped for an HTML table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Columns are the union of document keys in first-appearance order,
    /// minus `_id`. With no documents, `fallback_columns` supplies the header.
    pub fn from_records(records: &[Document], fallback_columns: &[String]) -> Self {
        let mut keys: Vec<&str> = Vec::new();
        for record in records {
            for key in record.keys() {
                if key != "_id" && !keys.contains(&key.as_str()) {
                    keys.push(key);
                }
            }
        }
        if records.is_empty() {
            keys = fallback_columns.iter().map(String::as_str).collect();
        }

        let rows = records
            .iter()
            .map(|record| {
                keys.iter()
                    .map(|key| record.get(*key).map(format_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self {
            columns: keys.iter().map(|k| k.replace('_', " ")).collect(),
            rows,
        }
    }

    /// The single-column table shown in place of data when a read fails.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            columns: vec!["Error".to_string()],
            rows: vec![vec![message.to_string()]],
        }
    }
}

pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(format_cell)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
