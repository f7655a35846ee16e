//! Initialize a lander project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use lander_config::ConfigSnapshot;

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing lander...");

    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    tracing::info!("Created {}", config_path.display());

    let document = config_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("landing.json");
    if !document.exists() || yes {
        let json = ConfigSnapshot::default().to_json_pretty()?;
        fs::write(&document, json)
            .with_context(|| format!("Failed to write {}", document.display()))?;
        tracing::info!("Created {}", document.display());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'lander transform' after your site build, then 'lander dev'.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Lander Configuration

[site]
# Output of your site build
build_dir = "out"

# Relocatable bundle written by `lander transform`
bundle_dir = "dist-offline/site"

# Entry document of the site
entry = "index.html"

# Landing page document used by `lander package`
document = "landing.json"

# Write README-OFFLINE.txt and start scripts next to the bundle
launchers = true

[editor]
# Editor document inside the site build, and its name in the bundle
source = "editor/index.html"
entry = "editor.html"

# Bundle paths under this prefix never ship in the archive
prefix = "editor/"

[publish]
title = "Landing Page"
archive = "site.zip"

[server]
host = "127.0.0.1"
port = 7777

# Origins the preview accepts updates from (defaults to the server itself)
allowed_origins = []

[storage]
# Where the saved configuration is kept between sessions
dir = ".lander"
"#;
