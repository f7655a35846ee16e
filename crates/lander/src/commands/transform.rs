//! Bundle transform command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use lander_publish::Transformer;

use crate::config::ConfigFile;

/// Run the transform command.
pub async fn run(
    file_config: &ConfigFile,
    build: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = file_config.transform_config();
    if let Some(build) = build {
        config.build_dir = build;
    }
    if let Some(output) = output {
        config.bundle_dir = output;
    }

    tracing::info!(
        "Transforming {} into {}...",
        config.build_dir.display(),
        config.bundle_dir.display()
    );

    let result = tokio::task::spawn_blocking(move || Transformer::new(config).run())
        .await
        .context("Transform task failed")??;

    tracing::info!(
        "Bundled {} files ({} documents rewritten) in {}ms",
        result.files,
        result.rewritten,
        result.duration_ms
    );
    tracing::info!("Output: {}", result.bundle_dir.display());
    for launcher in &result.launchers {
        tracing::info!("Wrote {}", launcher.display());
    }

    Ok(())
}
