use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use libreforms_common::FormCatalog;

use crate::config::{LibreformsConfig, SiteConfig};
use crate::store::{DocumentDb, StoreHandle};

use super::assets::static_handler;
use super::routes::{self, AppState, SharedState};

/// Configuration for the form server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub dev_mode: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            db_path: PathBuf::from(".libreforms/documents.db"),
            dev_mode: false,
        }
    }
}

impl From<&LibreformsConfig> for ServerConfig {
    fn from(config: &LibreformsConfig) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            db_path: config.database.path.clone(),
            dev_mode: config.server.dev,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Build the full application router: pages, JSON API and static assets.
pub fn build_router(state: SharedState) -> Router {
    routes::app_router()
        .route("/static/{*path}", get(static_handler))
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the document database and serve until Ctrl+C.
pub async fn start_server(config: ServerConfig, catalog: FormCatalog, site: SiteConfig) -> Result<()> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let db = DocumentDb::new(&config.db_path).context("Failed to initialize document database")?;
    info!(path = %config.db_path.display(), forms = catalog.len(), "Opened document database");

    let state = Arc::new(AppState::new(
        Arc::new(catalog),
        Arc::new(StoreHandle::new(db)),
        site,
    ));

    let mut app = build_router(state);
    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!("libreForms running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
