//! Archive packaging command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lander_config::{resolve_json, ConfigDocument, ConfigSnapshot};
use lander_publish::{DirSource, HttpSource, Publisher};
use lander_store::DurableSlots;

use crate::config::ConfigFile;

/// Run the package command.
pub async fn run(
    file_config: &ConfigFile,
    bundle: Option<PathBuf>,
    url: Option<String>,
    landing: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let live = load_document(file_config, landing)?;
    let publisher = Publisher::new(file_config.publish_config());

    let published = match url {
        Some(url) => {
            tracing::info!("Packaging from {}...", url);
            let source = HttpSource::new(&url)?;
            publisher.publish(&source, &live).await?
        }
        None => {
            let dir = bundle.unwrap_or_else(|| file_config.site.bundle_dir.clone());
            tracing::info!("Packaging {}...", dir.display());
            publisher.publish(&DirSource::new(dir), &live).await?
        }
    };

    let output = output
        .unwrap_or_else(|| default_output(&file_config.site.bundle_dir, &published.file_name));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&output, &published.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        "Packaged {} files ({} bytes)",
        published.entries.len(),
        published.bytes.len()
    );
    tracing::info!("Output: {}", output.display());

    Ok(())
}

/// The configuration to publish: an explicit document, the project's
/// document, the editor's saved state, or the defaults, in that order.
fn load_document(file_config: &ConfigFile, landing: Option<PathBuf>) -> Result<ConfigSnapshot> {
    let document = landing.or_else(|| {
        let path = &file_config.site.document;
        path.exists().then(|| path.clone())
    });

    if let Some(path) = document {
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = resolve_json(ConfigSnapshot::default(), &source)
            .with_context(|| format!("Invalid landing page document {}", path.display()))?;
        tracing::info!("Using {}", path.display());
        return Ok(config);
    }

    let slots = DurableSlots::on_disk(&file_config.storage.dir);
    match slots.load::<ConfigDocument>() {
        Some(stored) => {
            tracing::info!("Using saved state from {}", file_config.storage.dir.display());
            Ok(stored.resolve(ConfigSnapshot::default()))
        }
        None => {
            tracing::warn!("No landing page document found; packaging the defaults");
            Ok(ConfigSnapshot::default())
        }
    }
}

/// The archive goes next to the bundle directory.
fn default_output(bundle_dir: &Path, file_name: &str) -> PathBuf {
    bundle_dir
        .parent()
        .map(|parent| parent.join(file_name))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lander_publish::{TransformConfig, Transformer};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn project(root: &Path) -> ConfigFile {
        let mut config = ConfigFile::default();
        config.site.build_dir = root.join("out");
        config.site.bundle_dir = root.join("dist-offline/site");
        config.site.document = root.join("landing.json");
        config.storage.dir = root.join(".lander");
        config
    }

    #[test]
    fn archive_defaults_next_to_bundle() {
        assert_eq!(
            default_output(Path::new("dist-offline/site"), "site.zip"),
            PathBuf::from("dist-offline/site.zip")
        );
    }

    #[test]
    fn explicit_document_wins() {
        let temp = tempdir().unwrap();
        let config = project(temp.path());
        let landing = temp.path().join("custom.json");
        fs::write(&landing, r#"{"header":{"brandName":"Custom"}}"#).unwrap();
        fs::write(&config.site.document, r#"{"header":{"brandName":"Project"}}"#).unwrap();

        let loaded = load_document(&config, Some(landing)).unwrap();

        assert_eq!(loaded.header.brand_name, "Custom");
        assert_eq!(loaded.header.brand_initials, "LB");
    }

    #[test]
    fn falls_back_to_saved_state_then_defaults() {
        let temp = tempdir().unwrap();
        let config = project(temp.path());

        assert_eq!(load_document(&config, None).unwrap(), ConfigSnapshot::default());

        let slots = DurableSlots::on_disk(&config.storage.dir);
        slots.save(&with_headline("Saved")).unwrap();

        assert_eq!(load_document(&config, None).unwrap().hero.headline, "Saved");
    }

    #[test]
    fn malformed_document_is_an_error() {
        let temp = tempdir().unwrap();
        let config = project(temp.path());
        fs::write(&config.site.document, "{ nope").unwrap();

        assert!(load_document(&config, None).is_err());
    }

    #[tokio::test]
    async fn writes_archive() {
        let temp = tempdir().unwrap();
        let config = project(temp.path());
        fs::create_dir_all(&config.site.build_dir).unwrap();
        fs::write(config.site.build_dir.join("index.html"), "<body></body>").unwrap();
        Transformer::new(TransformConfig {
            build_dir: config.site.build_dir.clone(),
            bundle_dir: config.site.bundle_dir.clone(),
            ..Default::default()
        })
        .run()
        .unwrap();

        run(&config, None, None, None, None).await.unwrap();

        let archive = temp.path().join("dist-offline/site.zip");
        assert!(fs::read(&archive).unwrap().starts_with(b"PK"));
    }

    fn with_headline(headline: &str) -> ConfigSnapshot {
        let mut config = ConfigSnapshot::default();
        config.hero.headline = headline.to_string();
        config
    }
}
