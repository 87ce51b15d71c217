//! Project setup command — `libreforms init`.

use std::path::Path;

use anyhow::{Context, Result};

use libreforms::config::{CONFIG_FILE, LibreformsConfig};
use libreforms::store::DocumentDb;

/// Create the document database and, if missing, a default `libreforms.toml`.
pub fn cmd_init(config: &LibreformsConfig, write_config: bool) -> Result<()> {
    let db_path = &config.database.path;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    DocumentDb::new(db_path).context("Failed to initialize document database")?;
    println!("Database initialized at {}", db_path.display());

    if write_config {
        let config_path = Path::new(CONFIG_FILE);
        if config_path.exists() {
            println!("{} already exists, leaving it untouched.", CONFIG_FILE);
        } else {
            config.save(config_path)?;
            println!("Created {}", CONFIG_FILE);
        }
    }
    Ok(())
}
