//! Declarative form definitions.
//!
//! A form definition is an ordered list of fields plus the meta-options
//! declared with a leading underscore (`_dashboard`, `_allow_uploads`, ...).
//! Fields look like this in the forms file:
//!
//! ```yaml
//! Age:
//!   input_field: { type: number, content: [18] }
//!   output_data:
//!     type: int
//!     required: true
//!     validators:
//!       - range: { min: 0, max: 130 }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;

use crate::error::CatalogError;

/// HTML widget used to collect a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Text,
    Textarea,
    Number,
    Date,
    Radio,
    Checkbox,
    Select,
    Hidden,
}

impl InputKind {
    /// Resolve a widget name; unknown names render as a text box.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "textarea" => Self::Textarea,
            "number" => Self::Number,
            "date" => Self::Date,
            "radio" => Self::Radio,
            "checkbox" => Self::Checkbox,
            "select" => Self::Select,
            "hidden" => Self::Hidden,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Date => "date",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Select => "select",
            Self::Hidden => "hidden",
        }
    }

    /// Widgets whose `content` is a list of options rather than a default.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Radio | Self::Checkbox | Self::Select)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputField {
    pub kind: InputKind,
    pub content: Vec<String>,
}

/// A check applied to a submitted value after type conversion.
#[derive(Debug, Clone)]
pub enum Validator {
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
    OneOf(Vec<String>),
    Regexp(Regex),
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Length { min: a, max: b }, Self::Length { min: c, max: d }) => a == c && b == d,
            (Self::Range { min: a, max: b }, Self::Range { min: c, max: d }) => a == c && b == d,
            (Self::OneOf(a), Self::OneOf(b)) => a == b,
            (Self::Regexp(a), Self::Regexp(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputData {
    /// Raw type tag from the definition (`str`, `int`, ...). Dispatch and
    /// fallback happen in [`crate::schema::ValueKind::from_tag`].
    pub type_tag: String,
    pub required: bool,
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub input: InputField,
    pub output: OutputData,
    pub description: Option<String>,
}

impl FieldSpec {
    /// Human-readable label: underscores become spaces.
    pub fn label(&self) -> String {
        self.name.replace('_', " ")
    }

    /// Pre-filled value for text-like widgets, or the pre-selected option
    /// for radio and select widgets.
    pub fn default_value(&self) -> Option<&str> {
        match self.input.kind {
            InputKind::Checkbox => None,
            _ => self.input.content.first().map(String::as_str),
        }
    }

    pub(crate) fn from_yaml(form: &str, name: &str, value: &YamlValue) -> Result<Self, CatalogError> {
        let invalid = |message: String| CatalogError::InvalidField {
            form: form.to_string(),
            field: name.to_string(),
            message,
        };

        let raw: RawField = serde_yaml::from_value(value.clone()).map_err(|e| invalid(e.to_string()))?;

        let input = match raw.input_field {
            Some(input) => InputField {
                kind: input
                    .kind
                    .as_deref()
                    .map(InputKind::from_name)
                    .unwrap_or_default(),
                content: scalar_list(&input.content).map_err(|m| invalid(format!("content: {}", m)))?,
            },
            None => InputField::default(),
        };

        let mut validators = Vec::new();
        for spec in raw.output_data.validators {
            if let Some(bounds) = spec.length {
                validators.push(Validator::Length {
                    min: bounds.min,
                    max: bounds.max,
                });
            }
            if let Some(bounds) = spec.range {
                validators.push(Validator::Range {
                    min: bounds.min,
                    max: bounds.max,
                });
            }
            if let Some(choices) = spec.one_of {
                let choices = scalar_list(&choices).map_err(|m| invalid(format!("one_of: {}", m)))?;
                validators.push(Validator::OneOf(choices));
            }
            if let Some(pattern) = spec.regexp {
                let anchored = format!("^(?:{})$", pattern);
                let regex = Regex::new(&anchored).map_err(|source| CatalogError::BadPattern {
                    form: form.to_string(),
                    field: name.to_string(),
                    source,
                })?;
                validators.push(Validator::Regexp(regex));
            }
        }

        Ok(Self {
            name: name.to_string(),
            input,
            output: OutputData {
                type_tag: raw.output_data.type_tag,
                required: raw.output_data.required,
                validators,
            },
            description: raw.description,
        })
    }
}

/// Line chart configuration from the `_dashboard` option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardConfig {
    pub kind: String,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
}

/// Application-defined meta-options with user overrides applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FormOptions {
    pub dashboard: Option<DashboardConfig>,
    pub allow_repeat: bool,
    pub allow_uploads: bool,
    pub allow_csv_templates: bool,
    pub suppress_default_values: bool,
    /// Underscore keys the application does not interpret, kept verbatim.
    pub extra: Vec<(String, serde_json::Value)>,
}

impl FormOptions {
    pub(crate) fn from_meta(form: &str, meta: Vec<(String, YamlValue)>) -> Result<Self, CatalogError> {
        let mut options = Self::default();
        for (key, value) in meta {
            let invalid = |message: String| CatalogError::InvalidOption {
                form: form.to_string(),
                option: key.clone(),
                message,
            };
            match key.as_str() {
                "_dashboard" => options.dashboard = parse_dashboard(&value).map_err(invalid)?,
                "_allow_repeat" => options.allow_repeat = expect_bool(&value).map_err(invalid)?,
                "_allow_uploads" => options.allow_uploads = expect_bool(&value).map_err(invalid)?,
                "_allow_csv_templates" => {
                    options.allow_csv_templates = expect_bool(&value).map_err(invalid)?
                }
                "_suppress_default_values" => {
                    options.suppress_default_values = expect_bool(&value).map_err(invalid)?
                }
                _ => {
                    let json = serde_json::to_value(&value).map_err(|e| invalid(e.to_string()))?;
                    options.extra.push((key.clone(), json));
                }
            }
        }
        Ok(options)
    }
}

#[derive(Debug, Clone)]
pub struct FormDefinition {
    pub name: String,
    fields: Vec<FieldSpec>,
    options: FormOptions,
}

impl FormDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>, options: FormOptions) -> Self {
        Self {
            name: name.into(),
            fields,
            options,
        }
    }

    /// Fields to render, with meta-options already stripped.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }
}

// ── Raw deserialization shapes ───────────────────────────────────────

#[derive(Deserialize)]
struct RawField {
    #[serde(default)]
    input_field: Option<RawInput>,
    output_data: RawOutput,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct RawInput {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    content: YamlValue,
}

#[derive(Deserialize)]
struct RawOutput {
    #[serde(rename = "type", default = "default_type_tag")]
    type_tag: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    validators: Vec<RawValidator>,
}

fn default_type_tag() -> String {
    "str".to_string()
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawValidator {
    #[serde(default)]
    length: Option<Bounds<usize>>,
    #[serde(default)]
    range: Option<Bounds<f64>>,
    #[serde(default)]
    one_of: Option<YamlValue>,
    #[serde(default)]
    regexp: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Bounds<T> {
    min: Option<T>,
    max: Option<T>,
}

#[derive(Deserialize)]
struct RawDashboardFields {
    x: String,
    y: String,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Deserialize)]
struct RawDashboard {
    #[serde(rename = "type", default = "default_chart_kind")]
    kind: String,
    fields: RawDashboardFields,
}

fn default_chart_kind() -> String {
    "linechart".to_string()
}

fn parse_dashboard(value: &YamlValue) -> Result<Option<DashboardConfig>, String> {
    match value {
        YamlValue::Null | YamlValue::Bool(false) => Ok(None),
        YamlValue::Mapping(_) => {
            let raw: RawDashboard = serde_yaml::from_value(value.clone()).map_err(|e| e.to_string())?;
            if raw.kind != "linechart" {
                return Err(format!("unsupported chart type '{}', expected 'linechart'", raw.kind));
            }
            Ok(Some(DashboardConfig {
                kind: raw.kind,
                x: raw.fields.x,
                y: raw.fields.y,
                color: raw.fields.color,
            }))
        }
        _ => Err("expected false or a mapping with a 'fields' section".to_string()),
    }
}

fn expect_bool(value: &YamlValue) -> Result<bool, String> {
    match value {
        YamlValue::Bool(b) => Ok(*b),
        _ => Err("expected true or false".to_string()),
    }
}

fn scalar_string(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Accept `null`, a single scalar, or a list of scalars.
fn scalar_list(value: &YamlValue) -> Result<Vec<String>, String> {
    match value {
        YamlValue::Null => Ok(Vec::new()),
        YamlValue::Sequence(items) => items
            .iter()
            .map(|item| scalar_string(item).ok_or_else(|| "expected a list of scalar values".to_string()))
            .collect(),
        other => scalar_string(other)
            .map(|s| vec![s])
            .ok_or_else(|| "expected a scalar or a list of scalars".to_string()),
    }
}
