//! Stage B: pack a bundle and the live configuration into one archive.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use lander_config::ConfigSnapshot;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::html::{insert_after_body_open, replace_title};
use crate::manifest::{Manifest, MANIFEST_FILE};
use crate::source::{AssetSource, FetchError};
use crate::templates::TemplateEngine;

/// Configuration for packaging.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Manifest location inside the bundle
    pub manifest_path: String,

    /// Entry document that receives the bootstrap script
    pub site_entry: String,

    /// Editor document left out of the archive
    pub editor_entry: String,

    /// Every bundle path under this prefix is left out of the archive
    pub editor_prefix: String,

    /// Title the entry document is published with
    pub title: String,

    /// File name of the produced archive
    pub archive_name: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            manifest_path: MANIFEST_FILE.to_string(),
            site_entry: "index.html".to_string(),
            editor_entry: "editor.html".to_string(),
            editor_prefix: "editor/".to_string(),
            title: "Landing Page".to_string(),
            archive_name: "site.zip".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Manifest {path} is unavailable ({reason}). Run `lander transform` first.")]
    ManifestMissing { path: String, reason: String },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("A publish is already in progress")]
    InProgress,

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),
}

/// A finished archive, ready to hand to the user.
#[derive(Debug, Clone)]
pub struct PublishBundle {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Archive entries in the order they were written
    pub entries: Vec<String>,
}

/// Produces standalone archives of the landing page.
///
/// Only one publish runs at a time per publisher; a second request made while
/// one is in flight fails with [`PublishError::InProgress`].
pub struct Publisher {
    config: PublishConfig,
    templates: TemplateEngine,
    in_flight: AtomicBool,
}

impl Publisher {
    pub fn new(config: PublishConfig) -> Self {
        Self {
            config,
            templates: TemplateEngine::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    pub fn is_publishing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Whether `path` stays out of the archive.
    pub fn is_excluded(&self, path: &str) -> bool {
        let path = path.trim_start_matches("./").trim_start_matches('/');
        path == self.config.manifest_path
            || path == self.config.editor_entry
            || path.starts_with(&self.config.editor_prefix)
    }

    /// Package the bundle behind `source` with `live` as the embedded
    /// configuration.
    ///
    /// Fetches run one after another; the first failure aborts the publish
    /// with its message unchanged.
    pub async fn publish(
        &self,
        source: &dyn AssetSource,
        live: &ConfigSnapshot,
    ) -> Result<PublishBundle, PublishError> {
        let _guard = PublishGuard::acquire(&self.in_flight)?;

        let manifest_text = source
            .fetch_text(&self.config.manifest_path)
            .await
            .map_err(|e| PublishError::ManifestMissing {
                path: self.config.manifest_path.clone(),
                reason: e.to_string(),
            })?;
        let manifest = Manifest::parse(&manifest_text)
            .map_err(|e| PublishError::InvalidManifest(e.to_string()))?;

        let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(manifest.len());
        for path in &manifest.files {
            if self.is_excluded(path) {
                tracing::debug!("Skipping {}", path);
                continue;
            }
            let bytes = source.fetch_bytes(path).await?;
            entries.push((path.clone(), bytes));
        }

        let document = source.fetch_text(&self.config.site_entry).await?;
        let document = replace_title(&document, &self.config.title);

        let script = self
            .templates
            .bootstrap_script(&live.publish_view())
            .map_err(|e| PublishError::TemplateError(e.to_string()))?;
        let document = insert_after_body_open(&document, &script).into_bytes();

        match entries
            .iter_mut()
            .find(|(path, _)| *path == self.config.site_entry)
        {
            Some(entry) => entry.1 = document,
            None => entries.push((self.config.site_entry.clone(), document)),
        }

        let names: Vec<String> = entries.iter().map(|(path, _)| path.clone()).collect();
        let bytes = tokio::task::spawn_blocking(move || write_archive(&entries))
            .await
            .map_err(|e| PublishError::ArchiveError(e.to_string()))??;

        tracing::info!(
            "Packaged {} files into {} ({} bytes)",
            names.len(),
            self.config.archive_name,
            bytes.len()
        );

        Ok(PublishBundle {
            file_name: self.config.archive_name.clone(),
            bytes,
            entries: names,
        })
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(PublishConfig::default())
    }
}

/// Holds the in-flight flag for the duration of one publish.
struct PublishGuard<'a>(&'a AtomicBool);

impl<'a> PublishGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, PublishError> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| PublishError::InProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for PublishGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn write_archive(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, PublishError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, bytes) in entries {
        zip.start_file(path.as_str(), options)
            .map_err(|e| PublishError::ArchiveError(format!("{}: {}", path, e)))?;
        zip.write_all(bytes)
            .map_err(|e| PublishError::ArchiveError(format!("{}: {}", path, e)))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| PublishError::ArchiveError(e.to_string()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::Notify;

    use crate::source::DirSource;
    use crate::templates::BOOTSTRAP_GLOBAL;
    use crate::transform::{TransformConfig, Transformer};

    const ENTRY: &str = r#"<html><head><title>Landing Page Editor</title></head><body class="page"><main>Hi</main></body></html>"#;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn bundle() -> TempDir {
        let temp = tempdir().unwrap();
        let out = temp.path().join("out");
        write(&out.join("index.html"), ENTRY);
        write(&out.join("editor/index.html"), "<body>editor</body>");
        write(&out.join("_next/app.js"), "app");
        write(&out.join("logo.svg"), "<svg/>");

        Transformer::new(TransformConfig {
            build_dir: out,
            bundle_dir: temp.path().join("site"),
            ..Default::default()
        })
        .run()
        .unwrap();
        temp
    }

    fn read_entry(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    fn embedded_config(html: &str) -> ConfigSnapshot {
        let start = html.find("var config = ").unwrap() + "var config = ".len();
        let end = start + html[start..].find(";\n").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[tokio::test]
    async fn excludes_editor_assets_and_manifest() {
        let temp = bundle();
        let source = DirSource::new(temp.path().join("site"));

        let published = Publisher::default()
            .publish(&source, &ConfigSnapshot::default())
            .await
            .unwrap();

        assert_eq!(published.file_name, "site.zip");
        assert_eq!(
            published.entries,
            vec!["_next/app.js", "index.html", "logo.svg"]
        );

        let archive = zip::ZipArchive::new(Cursor::new(published.bytes.as_slice())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["_next/app.js", "index.html", "logo.svg"]);
    }

    #[tokio::test]
    async fn entry_document_embeds_publish_view() {
        let temp = bundle();
        let source = DirSource::new(temp.path().join("site"));
        let mut live = ConfigSnapshot::default();
        live.hero.headline = "Launch day".to_string();

        let published = Publisher::default().publish(&source, &live).await.unwrap();
        let html = read_entry(&published.bytes, "index.html");

        assert_eq!(embedded_config(&html), live.publish_view());
        assert_eq!(embedded_config(&html).header.show_editor_link, Some(false));
        assert!(html.contains("<title>Landing Page</title>"));
        assert!(html.contains(&format!("window.{} = config;", BOOTSTRAP_GLOBAL)));
        assert!(html.starts_with(
            r#"<html><head><title>Landing Page</title></head><body class="page"><script id="lander-bootstrap">"#
        ));
        assert!(html.ends_with("</script><main>Hi</main></body></html>"));
    }

    #[tokio::test]
    async fn binary_assets_keep_every_byte() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("out");
        write(&out.join("index.html"), ENTRY);
        let image = vec![0x89, b'P', b'N', b'G', 0xff, 0x00, 0xfe, 0x0d, 0x0a, 0x1a, 0x00, 0x80];
        fs::create_dir_all(out.join("img")).unwrap();
        fs::write(out.join("img/logo.png"), &image).unwrap();
        Transformer::new(TransformConfig {
            build_dir: out,
            bundle_dir: temp.path().join("site"),
            ..Default::default()
        })
        .run()
        .unwrap();

        let source = DirSource::new(temp.path().join("site"));
        let published = Publisher::default()
            .publish(&source, &ConfigSnapshot::default())
            .await
            .unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(published.bytes.as_slice())).unwrap();
        let mut entry = archive.by_name("img/logo.png").unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, image);
    }

    #[tokio::test]
    async fn other_assets_are_copied_verbatim() {
        let temp = bundle();
        let source = DirSource::new(temp.path().join("site"));

        let published = Publisher::default()
            .publish(&source, &ConfigSnapshot::default())
            .await
            .unwrap();

        assert_eq!(read_entry(&published.bytes, "logo.svg"), "<svg/>");
        assert_eq!(read_entry(&published.bytes, "_next/app.js"), "app");
    }

    #[tokio::test]
    async fn missing_manifest_asks_for_transform() {
        let temp = tempdir().unwrap();
        let source = DirSource::new(temp.path());

        let err = Publisher::default()
            .publish(&source, &ConfigSnapshot::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::ManifestMissing { .. }));
        assert!(err.to_string().contains("lander transform"));
    }

    #[tokio::test]
    async fn fetch_failure_aborts_with_its_message() {
        let temp = bundle();
        let site = temp.path().join("site");
        fs::remove_file(site.join("logo.svg")).unwrap();

        let err = Publisher::default()
            .publish(&DirSource::new(&site), &ConfigSnapshot::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Not found: logo.svg");
    }

    #[tokio::test]
    async fn entry_missing_from_manifest_is_appended() {
        let temp = tempdir().unwrap();
        write(&temp.path().join("index.html"), "<body></body>");
        write(&temp.path().join(MANIFEST_FILE), r#"{"files":["a.txt"]}"#);
        write(&temp.path().join("a.txt"), "a");

        let published = Publisher::default()
            .publish(&DirSource::new(temp.path()), &ConfigSnapshot::default())
            .await
            .unwrap();

        assert_eq!(published.entries, vec!["a.txt", "index.html"]);
    }

    /// Source that parks on its first fetch until released.
    struct Gate {
        inner: DirSource,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl AssetSource for Gate {
        async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
            if path == MANIFEST_FILE {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.fetch_bytes(path).await
        }
    }

    #[tokio::test]
    async fn concurrent_publish_is_rejected() {
        let temp = bundle();
        let publisher = Arc::new(Publisher::default());
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gate = Gate {
            inner: DirSource::new(temp.path().join("site")),
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        };

        let first = {
            let publisher = Arc::clone(&publisher);
            tokio::spawn(async move {
                publisher
                    .publish(&gate, &ConfigSnapshot::default())
                    .await
                    .map(|b| b.entries.len())
            })
        };

        entered.notified().await;
        assert!(publisher.is_publishing());

        let second = publisher
            .publish(
                &DirSource::new(temp.path().join("site")),
                &ConfigSnapshot::default(),
            )
            .await;
        assert!(matches!(second, Err(PublishError::InProgress)));

        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), 3);
        assert!(!publisher.is_publishing());
    }

    #[test]
    fn exclusion_rules() {
        let publisher = Publisher::default();

        assert!(publisher.is_excluded("manifest.json"));
        assert!(publisher.is_excluded("editor.html"));
        assert!(publisher.is_excluded("editor/index.html"));
        assert!(publisher.is_excluded("./editor/chunk.js"));
        assert!(!publisher.is_excluded("editorial.html"));
        assert!(!publisher.is_excluded("index.html"));
    }
}
