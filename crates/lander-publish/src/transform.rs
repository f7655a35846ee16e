//! Stage A: turn a site build into a relocatable bundle.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::html::rewrite_root_absolute;
use crate::manifest::Manifest;
use crate::templates::{TemplateEngine, LAUNCHER_FILES};

/// Configuration for building a bundle.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Site build output to read from
    pub build_dir: PathBuf,

    /// Bundle directory, recreated on every run
    pub bundle_dir: PathBuf,

    /// Entry document that must exist in the build
    pub site_entry: String,

    /// Editor document inside the build, if the build has one
    pub editor_source: String,

    /// Where the editor document is placed in the bundle
    pub editor_entry: String,

    /// Write the offline launchers next to the bundle directory
    pub launchers: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("out"),
            bundle_dir: PathBuf::from("dist-offline/site"),
            site_entry: "index.html".to_string(),
            editor_source: "editor/index.html".to_string(),
            editor_entry: "editor.html".to_string(),
            launchers: true,
        }
    }
}

/// Result of a transform.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Files in the bundle, excluding the manifest
    pub files: usize,

    /// HTML documents whose references were rewritten
    pub rewritten: usize,

    /// Build duration in milliseconds
    pub duration_ms: u64,

    pub bundle_dir: PathBuf,

    pub manifest: Manifest,

    /// Launcher files written next to the bundle
    pub launchers: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Build directory not found: {0}. Run the site build first.")]
    BuildMissing(String),

    #[error("Build has no {0}. Run the site build first.")]
    EntryMissing(String),

    #[error("Bundle directory {0} must not overlap the build directory")]
    InvalidLayout(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Read error: {0}")]
    ReadError(String),

    #[error("Write error: {0}")]
    WriteError(String),
}

/// Builds a bundle that works from any base path, plus its manifest.
pub struct Transformer {
    config: TransformConfig,
    templates: TemplateEngine,
}

impl Transformer {
    pub fn new(config: TransformConfig) -> Self {
        Self {
            config,
            templates: TemplateEngine::new(),
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Run the transform.
    pub fn run(&self) -> Result<TransformResult, TransformError> {
        let start = Instant::now();
        let build = &self.config.build_dir;
        let bundle = &self.config.bundle_dir;

        if !build.is_dir() {
            return Err(TransformError::BuildMissing(build.display().to_string()));
        }
        if !build.join(&self.config.site_entry).is_file() {
            return Err(TransformError::EntryMissing(
                build.join(&self.config.site_entry).display().to_string(),
            ));
        }
        // The bundle is deleted below, so it must neither sit in the build
        // nor contain it.
        if is_within(bundle, build) || is_within(build, bundle) {
            return Err(TransformError::InvalidLayout(bundle.display().to_string()));
        }

        if bundle.exists() {
            fs::remove_dir_all(bundle).map_err(|e| TransformError::WriteError(e.to_string()))?;
        }
        fs::create_dir_all(bundle).map_err(|e| TransformError::WriteError(e.to_string()))?;

        let copied = copy_tree(build, bundle)?;
        tracing::debug!("Copied {} files into {}", copied.len(), bundle.display());

        let editor = build.join(&self.config.editor_source);
        if editor.is_file() {
            fs::copy(&editor, bundle.join(&self.config.editor_entry))
                .map_err(|e| TransformError::WriteError(e.to_string()))?;
        } else {
            tracing::debug!("No editor document at {}", editor.display());
        }

        let documents: Vec<PathBuf> = WalkDir::new(bundle)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_html(e.path()))
            .map(|e| e.into_path())
            .collect();

        let results: Vec<Result<bool, TransformError>> =
            documents.par_iter().map(|path| rewrite_document(path)).collect();

        let mut rewritten = 0;
        for result in results {
            if result? {
                rewritten += 1;
            }
        }

        let manifest =
            Manifest::scan(bundle).map_err(|e| TransformError::ReadError(e.to_string()))?;
        manifest
            .write(bundle)
            .map_err(|e| TransformError::WriteError(e.to_string()))?;

        let launchers = if self.config.launchers {
            self.write_launchers(bundle)?
        } else {
            Vec::new()
        };

        Ok(TransformResult {
            files: manifest.len(),
            rewritten,
            duration_ms: start.elapsed().as_millis() as u64,
            bundle_dir: bundle.clone(),
            manifest,
            launchers,
        })
    }

    /// Write the README and start scripts into the bundle's parent directory.
    fn write_launchers(&self, bundle: &Path) -> Result<Vec<PathBuf>, TransformError> {
        let parent = bundle.parent().filter(|p| !p.as_os_str().is_empty());
        let site = bundle.file_name().and_then(|n| n.to_str());
        let (Some(root), Some(site)) = (parent, site) else {
            tracing::debug!("No directory around {}; skipping launchers", bundle.display());
            return Ok(Vec::new());
        };

        let mut written = Vec::with_capacity(LAUNCHER_FILES.len());
        for name in LAUNCHER_FILES {
            let content = self
                .templates
                .launcher(name, site, &self.config.editor_entry)
                .map_err(|e| TransformError::TemplateError(e.to_string()))?;
            let path = root.join(name);
            let write_err = |e: std::io::Error| {
                TransformError::WriteError(format!("{}: {}", path.display(), e))
            };
            fs::write(&path, content).map_err(write_err)?;
            if name.ends_with(".sh") {
                make_executable(&path).map_err(write_err)?;
            }
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Copy every file under `from` into `to`, keeping the layout.
fn copy_tree(from: &Path, to: &Path) -> Result<Vec<PathBuf>, TransformError> {
    let mut copied = Vec::new();

    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|e| TransformError::ReadError(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| TransformError::ReadError(e.to_string()))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| TransformError::WriteError(e.to_string()))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).map_err(|e| {
                TransformError::WriteError(format!("{}: {}", target.display(), e))
            })?;
            copied.push(target);
        }
    }

    Ok(copied)
}

/// Rewrite one document in place. Returns whether it changed.
fn rewrite_document(path: &Path) -> Result<bool, TransformError> {
    let html = fs::read_to_string(path)
        .map_err(|e| TransformError::ReadError(format!("{}: {}", path.display(), e)))?;

    let rewritten = rewrite_root_absolute(&html);
    if rewritten == html {
        return Ok(false);
    }

    fs::write(path, rewritten.as_bytes())
        .map_err(|e| TransformError::WriteError(format!("{}: {}", path.display(), e)))?;
    Ok(true)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

fn is_within(path: &Path, dir: &Path) -> bool {
    let path = absolute(path);
    let dir = absolute(dir);
    path.starts_with(dir)
}

fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    // The bundle may not exist yet; resolve its parent instead.
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            absolute(parent).join(name)
        }
        _ => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}
