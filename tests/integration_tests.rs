//! Integration tests for the libreforms CLI.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const FORMS: &str = r#"
intake:
  Date:
    input_field: { type: date }
    output_data: { type: date, required: true }
  Site:
    input_field: { type: select, content: [north, south] }
    output_data: { type: str }
  Count:
    input_field: { type: number }
    output_data: { type: int }
  _dashboard:
    type: linechart
    fields: { x: Date, y: Count, color: Site }
  _allow_uploads: true
survey:
  Answer:
    input_field: { type: text }
    output_data: { type: str }
"#;

/// Helper to create a libreforms Command isolated from the caller's environment
fn libreforms(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("libreforms");
    cmd.current_dir(dir.path());
    for var in [
        "LIBREFORMS_HOST",
        "LIBREFORMS_PORT",
        "LIBREFORMS_DEV",
        "LIBREFORMS_DB_PATH",
        "LIBREFORMS_FORMS",
        "LIBREFORMS_SITE_NAME",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to create a project directory with a forms.yaml
fn create_project(forms: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("forms.yaml"), forms).unwrap();
    dir
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let dir = TempDir::new().unwrap();
        libreforms(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"));
    }

    #[test]
    fn test_version() {
        let dir = TempDir::new().unwrap();
        libreforms(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        let dir = TempDir::new().unwrap();
        libreforms(&dir).arg("frobnicate").assert().failure();
    }
}

// =============================================================================
// Project Setup
// =============================================================================

mod init {
    use super::*;

    #[test]
    fn test_init_creates_database_and_config() {
        let dir = create_project(FORMS);
        libreforms(&dir)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Database initialized"));

        assert!(dir.path().join(".libreforms/documents.db").exists());
        let toml = fs::read_to_string(dir.path().join("libreforms.toml")).unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("port = 8000"));
    }

    #[test]
    fn test_init_idempotent() {
        let dir = create_project(FORMS);
        libreforms(&dir).arg("init").assert().success();
        libreforms(&dir)
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_init_respects_db_path() {
        let dir = create_project(FORMS);
        libreforms(&dir)
            .args(["init", "--no-config", "--db-path", "data/forms.db"])
            .assert()
            .success();
        assert!(dir.path().join("data/forms.db").exists());
        assert!(!dir.path().join("libreforms.toml").exists());
    }
}

// =============================================================================
// Form Definitions
// =============================================================================

mod forms {
    use super::*;

    #[test]
    fn test_forms_lists_names_in_order() {
        let dir = create_project(FORMS);
        libreforms(&dir)
            .arg("forms")
            .assert()
            .success()
            .stdout("intake\nsurvey\n");
    }

    #[test]
    fn test_check_valid_catalog() {
        let dir = create_project(FORMS);
        libreforms(&dir)
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("intake"))
            .stdout(predicate::str::contains("Configuration is valid."));
    }

    #[test]
    fn test_check_reports_stored_documents() {
        let dir = create_project(FORMS);
        libreforms(&dir).arg("init").assert().success();
        {
            let db = libreforms::store::DocumentDb::new(
                &dir.path().join(".libreforms/documents.db"),
            )
            .unwrap();
            let mut doc = libreforms_common::Document::new();
            doc.insert("Answer".into(), serde_json::json!("yes"));
            db.insert_document("survey", &doc).unwrap();
        }
        libreforms(&dir)
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("survey (1 field, 1 stored)"))
            .stdout(predicate::str::contains("0 stored"));
    }

    #[test]
    fn test_check_warns_about_dashboard_fields() {
        let dir = create_project(
            r#"
intake:
  Date:
    input_field: { type: date }
    output_data: { type: date }
  _dashboard:
    type: linechart
    fields: { x: Date, y: Total }
"#,
        );
        libreforms(&dir)
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("'Total' is not a field of the form"));
    }

    #[test]
    fn test_check_rejects_bad_yaml() {
        let dir = create_project("intake: [not, a, mapping\n");
        libreforms(&dir)
            .arg("check")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load form definitions"));
    }

    #[test]
    fn test_check_missing_forms_file() {
        let dir = TempDir::new().unwrap();
        libreforms(&dir).arg("check").assert().failure();
    }

    #[test]
    fn test_forms_path_from_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("catalog.yaml"), FORMS).unwrap();
        fs::write(
            dir.path().join("libreforms.toml"),
            "[forms]\npath = \"catalog.yaml\"\n",
        )
        .unwrap();
        libreforms(&dir)
            .arg("forms")
            .assert()
            .success()
            .stdout(predicate::str::contains("survey"));
    }

    #[test]
    fn test_forms_path_from_env() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("other.yaml"), FORMS).unwrap();
        libreforms(&dir)
            .env("LIBREFORMS_FORMS", "other.yaml")
            .arg("forms")
            .assert()
            .success()
            .stdout(predicate::str::contains("intake"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = create_project(FORMS);
        libreforms(&dir)
            .args(["--config", "missing.toml", "forms"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read config file"));
    }
}

// =============================================================================
// Data Export
// =============================================================================

mod export {
    use super::*;
    use libreforms::store::DocumentDb;
    use libreforms_common::Document;
    use serde_json::json;

    #[test]
    fn test_export_without_database_fails() {
        let dir = create_project(FORMS);
        libreforms(&dir)
            .args(["export", "intake"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("libreforms init"));
    }

    #[test]
    fn test_export_prints_json_lines() {
        let dir = create_project(FORMS);
        libreforms(&dir).arg("init").assert().success();

        {
            let db = DocumentDb::new(&dir.path().join(".libreforms/documents.db")).unwrap();
            for count in [3, 7] {
                let mut doc = Document::new();
                doc.insert("Date".into(), json!("2022-05-01"));
                doc.insert("Count".into(), json!(count));
                db.insert_document("intake", &doc).unwrap();
            }
        }

        let output = libreforms(&dir)
            .args(["export", "intake"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["Count"], 3);
        assert_eq!(lines[1]["Count"], 7);
        assert!(lines[0]["_id"].is_string());
    }

    #[test]
    fn test_export_empty_collection() {
        let dir = create_project(FORMS);
        libreforms(&dir).arg("init").assert().success();
        libreforms(&dir)
            .args(["export", "survey"])
            .assert()
            .success()
            .stdout("");
    }
}
