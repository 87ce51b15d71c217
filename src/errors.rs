//! Typed errors for the web layer.
//!
//! Catalog and validation errors live in `libreforms-common`; this module
//! covers what can go wrong once a request names a form.

use thiserror::Error;

/// Errors from form, table and dashboard handling.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Form '{name}' not found")]
    UnknownForm { name: String },

    #[error("No dashboard has been configured for form '{name}'")]
    NoDashboard { name: String },

    #[error("Option '{option}' is not enabled for form '{name}'")]
    OptionDisabled { name: String, option: &'static str },

    #[error("Invalid upload: {0}")]
    BadUpload(String),

    #[error("Database error: {0}")]
    Store(#[source] anyhow::Error),

    #[error("Failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

impl FormError {
    pub fn unknown(name: &str) -> Self {
        Self::UnknownForm {
            name: name.to_string(),
        }
    }

    /// True when the failure means "nothing to show here" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownForm { .. } | Self::NoDashboard { .. } | Self::OptionDisabled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_form_carries_name() {
        let err = FormError::unknown("intake");
        match &err {
            FormError::UnknownForm { name } => assert_eq!(name, "intake"),
            _ => panic!("Expected UnknownForm"),
        }
        assert!(err.to_string().contains("intake"));
    }

    #[test]
    fn not_found_variants_are_classified() {
        assert!(FormError::unknown("x").is_not_found());
        assert!(
            FormError::NoDashboard {
                name: "x".into()
            }
            .is_not_found()
        );
        assert!(
            FormError::OptionDisabled {
                name: "x".into(),
                option: "_allow_uploads"
            }
            .is_not_found()
        );
        assert!(!FormError::Store(anyhow::anyhow!("disk full")).is_not_found());
        assert!(!FormError::BadUpload("empty".into()).is_not_found());
    }

    #[test]
    fn store_error_keeps_source() {
        use std::error::Error as _;
        let err = FormError::Store(anyhow::anyhow!("locked"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("locked"));
    }
}
