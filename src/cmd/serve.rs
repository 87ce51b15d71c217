//! Form server command — `libreforms serve`.

use anyhow::{Context, Result};
use tracing::{info, warn};

use libreforms::config::LibreformsConfig;
use libreforms::web::{ServerConfig, start_server};
use libreforms_common::FormCatalog;

pub async fn cmd_serve(config: LibreformsConfig, open: bool) -> Result<()> {
    for warning in config.validate() {
        warn!("{}", warning);
    }

    let catalog = FormCatalog::load(&config.forms.path).with_context(|| {
        format!(
            "Failed to load form definitions from {}",
            config.forms.path.display()
        )
    })?;
    info!(path = %config.forms.path.display(), forms = ?catalog.names(), "Loaded form definitions");

    // Spawn browser open before starting the server (which blocks)
    if open {
        let url = format!("http://localhost:{}", config.server.port);
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                warn!(error = %e, "Failed to open browser");
            }
        });
    }

    start_server(ServerConfig::from(&config), catalog, config.site.clone()).await
}
