use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use libreforms::config::{LibreformsConfig, Overrides};
use libreforms::logging::{self, LogOptions};

mod cmd;

#[derive(Parser)]
#[command(name = "libreforms")]
#[command(version, about = "Form builder: YAML form definitions served as web forms, tables and dashboards")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file (defaults to ./libreforms.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the form definitions file. Overrides libreforms.toml.
    #[arg(long, global = true)]
    pub forms: Option<PathBuf>,

    /// Path to the document database. Overrides libreforms.toml.
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the forms, tables and dashboards
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to serve on
        #[arg(short, long)]
        port: Option<u16>,

        /// Auto-open browser after server starts
        #[arg(long)]
        open: bool,

        /// Enable dev mode (permissive CORS)
        #[arg(long)]
        dev: bool,

        /// Emit logs as JSON
        #[arg(long)]
        json_logs: bool,

        /// Also write logs to a daily-rotated file in this directory
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },
    /// Create the document database and a default libreforms.toml
    Init {
        /// Only create the database
        #[arg(long)]
        no_config: bool,
    },
    /// Validate the configuration and form definitions
    Check,
    /// List the configured forms
    Forms,
    /// Print the stored documents of a form as JSON lines
    Export {
        /// Form (collection) name
        form: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut overrides = Overrides {
        db_path: cli.db_path.clone(),
        forms_path: cli.forms.clone(),
        ..Overrides::default()
    };
    if let Commands::Serve { host, port, dev, .. } = &cli.command {
        overrides.host = host.clone();
        overrides.port = *port;
        overrides.dev = *dev;
    }
    let config = LibreformsConfig::resolve(cli.config.as_deref(), &overrides)?;

    match &cli.command {
        Commands::Serve {
            open,
            json_logs,
            log_dir,
            ..
        } => {
            let _guard = logging::init(&LogOptions {
                verbose: cli.verbose,
                json: *json_logs,
                log_dir: log_dir.clone(),
            })?;
            cmd::cmd_serve(config, *open).await?;
        }
        Commands::Init { no_config } => cmd::cmd_init(&config, !no_config)?,
        Commands::Check => cmd::cmd_check(&config)?,
        Commands::Forms => cmd::cmd_forms(&config)?,
        Commands::Export { form } => cmd::cmd_export(&config, form)?,
    }

    Ok(())
}
