//! Editor server command.

use std::path::PathBuf;

use anyhow::Result;
use lander_server::{EditorServer, EditorServerConfig};

use crate::config::ConfigFile;

/// Run the editor server.
pub async fn run(
    file_config: &ConfigFile,
    port: Option<u16>,
    open: bool,
    landing: Option<PathBuf>,
    watch: bool,
) -> Result<()> {
    let port = port.unwrap_or(file_config.server.port);
    tracing::info!("Starting editor on port {}", port);

    if !file_config.site.bundle_dir.join(&file_config.site.entry).exists() {
        tracing::warn!(
            "No bundle at {}. Run 'lander transform' to enable the preview and publishing.",
            file_config.site.bundle_dir.display()
        );
    }

    let config = EditorServerConfig {
        bundle_dir: file_config.site.bundle_dir.clone(),
        port,
        host: file_config.server.host.clone(),
        open,
        allowed_origins: file_config.server.allowed_origins.clone(),
        state_dir: Some(file_config.storage.dir.clone()),
        config_file: landing,
        watch,
        publish: file_config.publish_config(),
    };

    EditorServer::new(config).start().await?;

    Ok(())
}
