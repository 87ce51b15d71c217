//! Field-type dispatch and submission validation.
//!
//! [`parse_form_fields`] turns a form definition into a [`FormSchema`]; the
//! schema then converts a decoded urlencoded body into a JSON document or a
//! set of per-field errors.

use chrono::NaiveDate;
use serde_json::{Map, Number, Value};

use crate::definition::{FormDefinition, Validator};
use crate::error::ValidationErrors;

/// A stored record: field name → JSON value, in field order.
pub type Document = Map<String, Value>;

const MISSING: &str = "Missing data for required field.";

/// Converted type of a submitted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Float,
    List,
    Int,
    /// ISO `YYYY-MM-DD`, stored as the submitted string.
    Date,
}

impl ValueKind {
    /// Dispatch on an `output_data.type` tag. Anything unrecognised is a string.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "str" => Self::Str,
            "float" => Self::Float,
            "list" => Self::List,
            "int" => Self::Int,
            "date" => Self::Date,
            _ => Self::Str,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub name: String,
    pub kind: ValueKind,
    pub required: bool,
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormSchema {
    pub form: String,
    rules: Vec<FieldRule>,
}

/// Build the validation schema for a form. Meta-options never become rules.
pub fn parse_form_fields(form: &FormDefinition) -> FormSchema {
    let rules = form
        .fields()
        .iter()
        .filter(|field| !field.name.starts_with('_'))
        .map(|field| FieldRule {
            name: field.name.clone(),
            kind: ValueKind::from_tag(&field.output.type_tag),
            required: field.output.required,
            validators: field.output.validators.clone(),
        })
        .collect();

    FormSchema {
        form: form.name.clone(),
        rules,
    }
}

impl FormSchema {
    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Convert and validate submitted pairs. Keys that are not fields of the
    /// form are ignored; every field is checked before returning.
    pub fn parse(&self, pairs: &[(String, String)]) -> Result<Document, ValidationErrors> {
        let mut document = Document::new();
        let mut errors = ValidationErrors::new();

        for rule in &self.rules {
            let values: Vec<&str> = pairs
                .iter()
                .filter(|(key, _)| key == &rule.name)
                .map(|(_, value)| value.as_str())
                .collect();

            match rule.convert(&values) {
                Ok(Some((value, raw))) => {
                    let before = errors.len();
                    for validator in &rule.validators {
                        if let Some(message) = check(validator, &value, &raw) {
                            errors.add(&rule.name, message);
                        }
                    }
                    if errors.len() == before {
                        document.insert(rule.name.clone(), value);
                    }
                }
                Ok(None) if rule.required => errors.add(&rule.name, MISSING),
                Ok(None) => {}
                Err(message) => errors.add(&rule.name, message),
            }
        }

        if errors.is_empty() {
            Ok(document)
        } else {
            Err(errors)
        }
    }
}

/// Textual form of a converted value, used by length/one_of/regexp checks.
enum Raw<'a> {
    One(&'a str),
    Many(Vec<&'a str>),
}

impl FieldRule {
    /// `Ok(None)` means the field is missing.
    fn convert<'a>(&self, values: &[&'a str]) -> Result<Option<(Value, Raw<'a>)>, String> {
        if self.kind == ValueKind::List {
            if values.is_empty() {
                return Ok(None);
            }
            let items = values.iter().map(|v| Value::String(v.to_string())).collect();
            return Ok(Some((Value::Array(items), Raw::Many(values.to_vec()))));
        }

        let raw = match values.last() {
            Some(v) if !v.is_empty() => *v,
            _ => return Ok(None),
        };

        let value = match self.kind {
            ValueKind::Str => Value::String(raw.to_string()),
            ValueKind::Date => {
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map_err(|_| "Not a valid date.".to_string())?;
                Value::String(raw.trim().to_string())
            }
            ValueKind::Int => {
                let n: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| "Not a valid integer.".to_string())?;
                Value::Number(n.into())
            }
            ValueKind::Float => {
                let f: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| "Not a valid number.".to_string())?;
                let n = Number::from_f64(f).ok_or_else(|| {
                    "Special numeric values (nan or infinity) are not permitted.".to_string()
                })?;
                Value::Number(n)
            }
            ValueKind::List => unreachable!("list handled above"),
        };
        Ok(Some((value, Raw::One(raw))))
    }
}

fn check(validator: &Validator, value: &Value, raw: &Raw<'_>) -> Option<String> {
    match validator {
        Validator::Length { min, max } => {
            let len = match raw {
                Raw::One(s) => s.chars().count(),
                Raw::Many(items) => items.len(),
            };
            let too_short = min.is_some_and(|m| len < m);
            let too_long = max.is_some_and(|m| len > m);
            if !too_short && !too_long {
                return None;
            }
            Some(match (min, max) {
                (Some(lo), Some(hi)) => format!("Length must be between {} and {}.", lo, hi),
                (Some(lo), None) => format!("Shorter than minimum length {}.", lo),
                (None, Some(hi)) => format!("Longer than maximum length {}.", hi),
                (None, None) => return None,
            })
        }
        Validator::Range { min, max } => {
            // Only numeric kinds carry a range.
            let n = value.as_f64()?;
            let below = min.is_some_and(|m| n < m);
            let above = max.is_some_and(|m| n > m);
            if !below && !above {
                return None;
            }
            Some(match (min, max) {
                (Some(lo), Some(hi)) => format!(
                    "Must be greater than or equal to {} and less than or equal to {}.",
                    lo, hi
                ),
                (Some(lo), None) => format!("Must be greater than or equal to {}.", lo),
                (None, Some(hi)) => format!("Must be less than or equal to {}.", hi),
                (None, None) => return None,
            })
        }
        Validator::OneOf(choices) => {
            let ok = match raw {
                Raw::One(s) => choices.iter().any(|c| c == s),
                Raw::Many(items) => items.iter().all(|item| choices.iter().any(|c| c == item)),
            };
            if ok {
                None
            } else {
                Some(format!("Must be one of: {}.", choices.join(", ")))
            }
        }
        Validator::Regexp(regex) => {
            let ok = match raw {
                Raw::One(s) => regex.is_match(s),
                Raw::Many(items) => items.iter().all(|item| regex.is_match(item)),
            };
            if ok {
                None
            } else {
                Some("String does not match expected pattern.".to_string())
            }
        }
    }
}
