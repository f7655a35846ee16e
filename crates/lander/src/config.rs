//! Project configuration (lander.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use lander_publish::{PublishConfig, TransformConfig, MANIFEST_FILE};

/// Default location of the project configuration.
pub const CONFIG_FILE: &str = "lander.toml";

/// Configuration file structure (lander.toml).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub site: SiteConfig,
    pub editor: EditorConfig,
    pub publish: PublishSettings,
    pub server: ServerSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Output of the site build
    pub build_dir: PathBuf,
    /// Where `lander transform` writes the bundle
    pub bundle_dir: PathBuf,
    pub entry: String,
    /// Landing page document used by `package` and `dev --landing`
    pub document: PathBuf,
    /// Write README and start scripts next to the bundle
    pub launchers: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("out"),
            bundle_dir: PathBuf::from("dist-offline/site"),
            entry: "index.html".to_string(),
            document: PathBuf::from("landing.json"),
            launchers: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Editor document inside the site build
    pub source: String,
    /// Editor document inside the bundle
    pub entry: String,
    /// Bundle paths belonging to the editor
    pub prefix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            source: "editor/index.html".to_string(),
            entry: "editor.html".to_string(),
            prefix: "editor/".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    pub title: String,
    pub archive: String,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            title: "Landing Page".to_string(),
            archive: "site.zip".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            allowed_origins: vec![],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the saved configuration
    pub dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".lander"),
        }
    }
}

impl ConfigFile {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn transform_config(&self) -> TransformConfig {
        TransformConfig {
            build_dir: self.site.build_dir.clone(),
            bundle_dir: self.site.bundle_dir.clone(),
            site_entry: self.site.entry.clone(),
            editor_source: self.editor.source.clone(),
            editor_entry: self.editor.entry.clone(),
            launchers: self.site.launchers,
        }
    }

    pub fn publish_config(&self) -> PublishConfig {
        PublishConfig {
            manifest_path: MANIFEST_FILE.to_string(),
            site_entry: self.site.entry.clone(),
            editor_entry: self.editor.entry.clone(),
            editor_prefix: self.editor.prefix.clone(),
            title: self.publish.title.clone(),
            archive_name: self.publish.archive.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let config = ConfigFile::load(&temp.path().join(CONFIG_FILE)).unwrap();

        assert_eq!(config.server.port, 7777);
        assert_eq!(config.site.bundle_dir, PathBuf::from("dist-offline/site"));
        assert_eq!(config.publish_config().archive_name, "site.zip");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "[server]\nport = 8080\n\n[editor]\nprefix = \"admin/\"\n",
        )
        .unwrap();

        let config = ConfigFile::load(&path).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.publish_config().editor_prefix, "admin/");
        assert_eq!(config.publish_config().editor_entry, "editor.html");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[server\nport = ").unwrap();

        let err = ConfigFile::load(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse"));
    }

    #[test]
    fn transform_config_follows_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "[site]\nbuild_dir = \"build\"\n").unwrap();

        let transform = ConfigFile::load(&path).unwrap().transform_config();

        assert_eq!(transform.build_dir, PathBuf::from("build"));
        assert_eq!(transform.editor_source, "editor/index.html");
        assert!(transform.launchers);
    }
}
