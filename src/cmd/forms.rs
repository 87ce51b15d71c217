//! Form catalog and data commands — `libreforms check | forms | export`.

use anyhow::{Context, Result, bail};

use libreforms::config::LibreformsConfig;
use libreforms::store::DocumentDb;
use libreforms_common::{FormCatalog, FormDefinition};

fn load_catalog(config: &LibreformsConfig) -> Result<FormCatalog> {
    FormCatalog::load(&config.forms.path).with_context(|| {
        format!(
            "Failed to load form definitions from {}",
            config.forms.path.display()
        )
    })
}

/// Dashboard axes that do not name a field of the form.
fn dashboard_warnings(form: &FormDefinition) -> Vec<String> {
    let Some(dashboard) = &form.options().dashboard else {
        return Vec::new();
    };
    let mut axes = vec![("x", &dashboard.x), ("y", &dashboard.y)];
    if let Some(color) = &dashboard.color {
        axes.push(("color", color));
    }
    axes.into_iter()
        .filter(|(_, field)| form.field(field).is_none())
        .map(|(axis, field)| {
            format!(
                "{}: dashboard {} field '{}' is not a field of the form",
                form.name, axis, field
            )
        })
        .collect()
}

fn describe(form: &FormDefinition) -> String {
    let options = form.options();
    let mut flags = Vec::new();
    if options.dashboard.is_some() {
        flags.push("dashboard");
    }
    if options.allow_repeat {
        flags.push("repeat");
    }
    if options.allow_uploads {
        flags.push("uploads");
    }
    if options.allow_csv_templates {
        flags.push("csv templates");
    }
    let fields = form.fields().len();
    let noun = if fields == 1 { "field" } else { "fields" };
    if flags.is_empty() {
        format!("{} {}", fields, noun)
    } else {
        format!("{} {}; {}", fields, noun, flags.join(", "))
    }
}

/// Validate the configuration and the form definitions.
pub fn cmd_check(config: &LibreformsConfig) -> Result<()> {
    println!();
    println!("{}", console::style("Checking configuration...").bold());
    println!();

    let catalog = load_catalog(config)?;
    let db = if config.database.path.exists() {
        Some(
            DocumentDb::new(&config.database.path)
                .context("Failed to open document database")?,
        )
    } else {
        None
    };

    println!("Forms file: {}", config.forms.path.display());
    for form in catalog.iter() {
        let stored = match &db {
            Some(db) => format!(", {} stored", db.count_documents(&form.name)?),
            None => String::new(),
        };
        println!(
            "  {} {} ({}{})",
            console::style("✓").green(),
            form.name,
            describe(form),
            stored
        );
    }

    let mut warnings = config.validate();
    for form in catalog.iter() {
        warnings.extend(dashboard_warnings(form));
    }

    println!();
    if warnings.is_empty() {
        println!("{}", console::style("Configuration is valid.").green());
    } else {
        println!("{}", console::style("Warnings:").yellow().bold());
        for warning in &warnings {
            println!("  {} {}", console::style("⚠").yellow(), warning);
        }
    }
    println!();
    Ok(())
}

/// Print one form name per line.
pub fn cmd_forms(config: &LibreformsConfig) -> Result<()> {
    let catalog = load_catalog(config)?;
    for name in catalog.names() {
        println!("{}", name);
    }
    Ok(())
}

/// Print every document of a collection as one JSON object per line.
pub fn cmd_export(config: &LibreformsConfig, form: &str) -> Result<()> {
    let db_path = &config.database.path;
    if !db_path.exists() {
        bail!(
            "No database found at {}. Run 'libreforms init' first.",
            db_path.display()
        );
    }
    let db = DocumentDb::new(db_path).context("Failed to open document database")?;
    for document in db.list_documents(form)? {
        let line = serde_json::to_string(&document.into_record())
            .context("Failed to encode document")?;
        println!("{}", line);
    }
    Ok(())
}
