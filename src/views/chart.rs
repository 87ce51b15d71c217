//! Line charts in the shape Plotly's `newPlot` accepts.

use serde::Serialize;
use serde_json::{Value, json};

use libreforms_common::{DashboardConfig, Document};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub name: String,
    pub x: Vec<Value>,
    pub y: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Value,
}

/// Field plotted on the y-axis: a non-empty override wins over the config.
pub fn resolve_y<'a>(dashboard: &'a DashboardConfig, y_override: Option<&'a str>) -> &'a str {
    match y_override {
        Some(y) if !y.trim().is_empty() => y,
        _ => &dashboard.y,
    }
}

/// One trace per distinct `color` value, in first-appearance order.
pub fn line_chart(records: &[Document], x: &str, y: &str, color: Option<&str>, title: &str) -> Figure {
    let mut traces: Vec<Trace> = Vec::new();

    for record in records {
        let group = match color {
            Some(field) => record.get(field).map(group_name).unwrap_or_default(),
            None => String::new(),
        };
        let index = match traces.iter().position(|t| t.name == group) {
            Some(i) => i,
            None => {
                traces.push(Trace {
                    kind: "scatter",
                    mode: "lines",
                    name: group,
                    x: Vec::new(),
                    y: Vec::new(),
                });
                traces.len() - 1
            }
        };
        let trace = &mut traces[index];
        trace.x.push(record.get(x).cloned().unwrap_or(Value::Null));
        trace.y.push(record.get(y).cloned().unwrap_or(Value::Null));
    }

    let mut layout = json!({
        "title": { "text": title },
        "xaxis": { "title": { "text": x } },
        "yaxis": { "title": { "text": y } },
    });
    if let Some(field) = color {
        layout["legend"] = json!({ "title": { "text": field } });
    }

    Figure {
        data: traces,
        layout,
    }
}

fn group_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
