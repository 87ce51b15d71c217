//! Shared form model for libreforms.
//!
//! | Module       | Responsibility                                              |
//! |--------------|-------------------------------------------------------------|
//! | `definition` | Field specs, input widgets, validators, meta-options        |
//! | `catalog`    | Loading the ordered form catalog from YAML                  |
//! | `schema`     | Field-type dispatch and submission parsing/validation       |
//! | `error`      | `CatalogError` and `ValidationErrors`                       |

pub mod catalog;
pub mod definition;
pub mod error;
pub mod schema;

pub use catalog::FormCatalog;
pub use definition::{
    DashboardConfig, FieldSpec, FormDefinition, FormOptions, InputField, InputKind, OutputData,
    Validator,
};
pub use error::{CatalogError, ValidationErrors};
pub use schema::{Document, FieldRule, FormSchema, ValueKind, parse_form_fields};
