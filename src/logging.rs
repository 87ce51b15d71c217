//! Tracing subscriber setup.
//!
//! Logs go to stderr, plain or JSON, and optionally to a daily-rotated file.
//! `RUST_LOG` overrides the default filter.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub json: bool,
    pub log_dir: Option<PathBuf>,
}

pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("libreforms={level},libreforms_common={level},tower_http={level}")
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process so buffered file logs are flushed.
pub fn init(options: &LogOptions) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(options.verbose)));

    let stderr_layer = if options.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "libreforms.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
