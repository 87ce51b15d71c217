//! Application configuration.
//!
//! Settings come from `libreforms.toml`, are then overridden by environment
//! variables (a `.env` file is honoured), and finally by CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//! dev = false
//!
//! [database]
//! path = ".libreforms/documents.db"
//!
//! [forms]
//! path = "forms.yaml"
//!
//! [site]
//! name = "libreForms"
//! homepage_msg = "Welcome to libreForms."
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "libreforms.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Permissive CORS for local front-end development
    #[serde(default)]
    pub dev: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dev: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".libreforms/documents.db")
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormsSection {
    #[serde(default = "default_forms_path")]
    pub path: PathBuf,
}

fn default_forms_path() -> PathBuf {
    PathBuf::from("forms.yaml")
}

impl Default for FormsSection {
    fn default() -> Self {
        Self {
            path: default_forms_path(),
        }
    }
}

/// Text shown in the page chrome and on the home page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    #[serde(default = "default_homepage_msg")]
    pub homepage_msg: String,
}

fn default_site_name() -> String {
    "libreForms".to_string()
}

fn default_homepage_msg() -> String {
    "Welcome to libreForms, an extensible form building abstraction layer. \
     Select a view from above to get started."
        .to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            homepage_msg: default_homepage_msg(),
        }
    }
}

/// Parsed `libreforms.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibreformsConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub forms: FormsSection,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Values given on the command line; `None` leaves the setting alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub forms_path: Option<PathBuf>,
    pub dev: bool,
}

impl LibreformsConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse libreforms.toml")
    }

    /// Load from `path`, or return defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize libreforms.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Full resolution: file → environment → CLI.
    ///
    /// An explicitly named config file must exist; the default one is optional.
    pub fn resolve(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::load(path)?,
            None => Self::load_or_default(Path::new(CONFIG_FILE))?,
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// Apply `LIBREFORMS_*` variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("LIBREFORMS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("LIBREFORMS_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("LIBREFORMS_PORT is not a valid port: '{}'", port))?;
        }
        if let Some(dev) = lookup("LIBREFORMS_DEV") {
            self.server.dev = matches!(dev.trim(), "1" | "true" | "TRUE" | "yes");
        }
        if let Some(path) = lookup("LIBREFORMS_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(path) = lookup("LIBREFORMS_FORMS") {
            self.forms.path = PathBuf::from(path);
        }
        if let Some(name) = lookup("LIBREFORMS_SITE_NAME") {
            self.site.name = name;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(host) = &overrides.host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(path) = &overrides.db_path {
            self.database.path = path.clone();
        }
        if let Some(path) = &overrides.forms_path {
            self.forms.path = path.clone();
        }
        if overrides.dev {
            self.server.dev = true;
        }
    }

    /// Non-fatal problems worth reporting at startup.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.server.host.trim().is_empty() {
            warnings.push("server.host is empty".to_string());
        }
        if self.server.port == 0 {
            warnings.push("server.port is 0; the OS will pick a random port".to_string());
        }
        if !self.forms.path.exists() {
            warnings.push(format!(
                "forms file {} does not exist",
                self.forms.path.display()
            ));
        }
        if self.site.name.trim().is_empty() {
            warnings.push("site.name is empty".to_string());
        }
        warnings
    }
}
