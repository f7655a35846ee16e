//! Serve a transformed bundle the way a static host would.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::Router;
use lander_publish::{Manifest, MANIFEST_FILE};
use tower_http::services::ServeDir;

use crate::config::ConfigFile;

/// Run the serve command.
pub async fn run(
    file_config: &ConfigFile,
    port: u16,
    dir: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| file_config.site.bundle_dir.clone());
    let entry = &file_config.site.entry;

    let missing = check_bundle(&dir, entry)?;
    if !missing.is_empty() {
        tracing::warn!(
            "{} files listed in {} are missing from {} (first: {})",
            missing.len(),
            MANIFEST_FILE,
            dir.display(),
            missing[0]
        );
    }

    let host = &file_config.server.host;
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid address {}:{}", host, port))?;

    let app = Router::new()
        .fallback_service(ServeDir::new(&dir).append_index_html_on_directories(true));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    if open {
        let _ = open::that(format!("http://{}/{}", addr, entry));
    }

    axum::serve(listener, app).await?;

    Ok(())
}

/// Check that `dir` holds a bundle with `entry`. Returns the manifest
/// entries that are not on disk.
fn check_bundle(dir: &Path, entry: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        anyhow::bail!(
            "Directory not found: {}. Run 'lander transform' first.",
            dir.display()
        );
    }
    if !dir.join(entry).is_file() {
        anyhow::bail!("{} has no {}", dir.display(), entry);
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    let Ok(text) = fs::read_to_string(&manifest_path) else {
        tracing::warn!(
            "No {} in {}; 'lander package' will not accept this directory",
            MANIFEST_FILE,
            dir.display()
        );
        return Ok(Vec::new());
    };
    let manifest = Manifest::parse(&text)
        .with_context(|| format!("Invalid manifest {}", manifest_path.display()))?;

    Ok(manifest
        .files
        .into_iter()
        .filter(|file| !dir.join(file).is_file())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempdir().unwrap();
        let err = check_bundle(&temp.path().join("site"), "index.html").unwrap_err();
        assert!(err.to_string().contains("lander transform"));
    }

    #[test]
    fn missing_entry_is_an_error() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("about.html"), "").unwrap();

        assert!(check_bundle(temp.path(), "index.html").is_err());
    }

    #[test]
    fn reports_files_missing_from_manifest() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "<body></body>").unwrap();
        fs::write(
            temp.path().join(MANIFEST_FILE),
            r#"{"files":["index.html","_next/app.js"]}"#,
        )
        .unwrap();

        let missing = check_bundle(temp.path(), "index.html").unwrap();

        assert_eq!(missing, vec!["_next/app.js".to_string()]);
    }

    #[test]
    fn bundle_without_manifest_is_served() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "").unwrap();

        assert!(check_bundle(temp.path(), "index.html").unwrap().is_empty());
    }
}
