//! Loading the ordered set of form definitions from a YAML file.

use std::path::Path;

use serde_yaml::Value as YamlValue;

use crate::definition::{FieldSpec, FormDefinition, FormOptions};
use crate::error::CatalogError;

/// All configured forms, in the order they appear in the forms file.
#[derive(Debug, Clone, Default)]
pub struct FormCatalog {
    forms: Vec<FormDefinition>,
}

impl FormCatalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, CatalogError> {
        let root: YamlValue = serde_yaml::from_str(content).map_err(CatalogError::Syntax)?;
        let mapping = match root {
            YamlValue::Null => return Ok(Self::default()),
            YamlValue::Mapping(m) => m,
            _ => return Err(CatalogError::NotAMapping),
        };

        let mut forms = Vec::with_capacity(mapping.len());
        for (key, value) in &mapping {
            let name = key.as_str().ok_or(CatalogError::NotAMapping)?;
            if !is_valid_form_name(name) {
                return Err(CatalogError::InvalidFormName {
                    name: name.to_string(),
                });
            }
            forms.push(parse_form(name, value)?);
        }
        Ok(Self { forms })
    }

    pub fn get(&self, name: &str) -> Option<&FormDefinition> {
        self.forms.iter().find(|f| f.name == name)
    }

    /// Form names for the navigation menu.
    pub fn names(&self) -> Vec<String> {
        self.forms.iter().map(|f| f.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormDefinition> {
        self.forms.iter()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

/// Form names double as collection names and URL segments.
fn is_valid_form_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('_')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn parse_form(name: &str, value: &YamlValue) -> Result<FormDefinition, CatalogError> {
    let mapping = match value {
        YamlValue::Mapping(m) => m,
        YamlValue::Null => return Ok(FormDefinition::new(name, Vec::new(), FormOptions::default())),
        _ => {
            return Err(CatalogError::FormNotAMapping {
                form: name.to_string(),
            });
        }
    };

    let mut fields = Vec::new();
    let mut meta = Vec::new();
    for (key, entry) in mapping {
        let key = key.as_str().ok_or_else(|| CatalogError::FormNotAMapping {
            form: name.to_string(),
        })?;
        if key.starts_with('_') {
            meta.push((key.to_string(), entry.clone()));
        } else {
            fields.push(FieldSpec::from_yaml(name, key, entry)?);
        }
    }

    let options = FormOptions::from_meta(name, meta)?;
    Ok(FormDefinition::new(name, fields, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
sample-form:
  Text_Field:
    input_field: { type: text, content: [NA] }
    output_data: { type: str, required: false }
  Int_Field:
    input_field: { type: number, content: [0] }
    output_data: { type: int, required: true }
  _allow_uploads: true
  _dashboard:
    type: linechart
    fields: { x: Text_Field, y: Int_Field }
another_form:
  Notes:
    input_field: { type: textarea }
    output_data: { type: str }
"#;

    #[test]
    fn parse_keeps_form_order_and_splits_meta() {
        let catalog = FormCatalog::parse(SAMPLE).unwrap();
        assert_eq!(catalog.names(), vec!["sample-form", "another_form"]);

        let form = catalog.get("sample-form").unwrap();
        assert_eq!(form.field_names(), vec!["Text_Field", "Int_Field"]);
        assert!(form.options().allow_uploads);
        assert!(form.options().dashboard.is_some());
        assert!(form.field("_dashboard").is_none());
    }

    #[test]
    fn empty_file_is_empty_catalog() {
        let catalog = FormCatalog::parse("").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn rejects_top_level_list() {
        let err = FormCatalog::parse("- a\n- b\n").unwrap_err();
        assert!(matches!(err, CatalogError::NotAMapping));
    }

    #[test]
    fn rejects_unsafe_form_names() {
        let err = FormCatalog::parse("\"bad name\": {}\n").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidFormName { .. }));
        let err = FormCatalog::parse("\"../x\": {}\n").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidFormName { .. }));
    }

    #[test]
    fn rejects_scalar_form_body() {
        let err = FormCatalog::parse("intake: 3\n").unwrap_err();
        assert!(matches!(err, CatalogError::FormNotAMapping { .. }));
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = FormCatalog::parse("intake: [unclosed\n").unwrap_err();
        assert!(matches!(err, CatalogError::Syntax(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = FormCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn load_missing_file_carries_path() {
        let err = FormCatalog::load(Path::new("/nonexistent/forms.yaml")).unwrap_err();
        match err {
            CatalogError::ReadFailed { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/forms.yaml"))
            }
            other => panic!("Expected ReadFailed, got {:?}", other),
        }
    }
}
