use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a form catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read forms file at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Forms file is not valid YAML: {0}")]
    Syntax(#[source] serde_yaml::Error),

    #[error("Forms file must be a mapping of form name to form definition")]
    NotAMapping,

    #[error("Invalid form name '{name}': use letters, digits, '-' or '_'")]
    InvalidFormName { name: String },

    #[error("Form '{form}' must be a mapping of field name to field spec")]
    FormNotAMapping { form: String },

    #[error("Form '{form}', field '{field}': {message}")]
    InvalidField {
        form: String,
        field: String,
        message: String,
    },

    #[error("Form '{form}', option '{option}': {message}")]
    InvalidOption {
        form: String,
        option: String,
        message: String,
    },

    #[error("Form '{form}', field '{field}': invalid pattern: {source}")]
    BadPattern {
        form: String,
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Per-field validation failures for one submission, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field.to_string(), vec![message])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in self.iter() {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}
