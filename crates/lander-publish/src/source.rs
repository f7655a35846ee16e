//! Where the publisher reads bundle files from.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid asset path: {0}")]
    InvalidPath(String),

    #[error("Failed to fetch {path}: {message}")]
    Failed { path: String, message: String },

    #[error("{0} is not valid UTF-8")]
    NotText(String),
}

/// A readable copy of a transformed bundle.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError>;

    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let bytes = self.fetch_bytes(path).await?;
        String::from_utf8(bytes).map_err(|_| FetchError::NotText(path.to_string()))
    }
}

/// Reads bundle files from a local directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

        if path.is_empty() || !safe {
            return Err(FetchError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetSource for DirSource {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let full = self.resolve(path)?;
        tokio::fs::read(&full).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(path.to_string()),
            _ => FetchError::Failed {
                path: path.to_string(),
                message: e.to_string(),
            },
        })
    }
}

/// Reads bundle files from a running server.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: Url,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base: &str) -> Result<Self, FetchError> {
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        let base = Url::parse(&normalized).map_err(|e| FetchError::Failed {
            path: base.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            base,
            client: reqwest::Client::new(),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

#[async_trait]
impl AssetSource for HttpSource {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|_| FetchError::InvalidPath(path.to_string()))?;

        let failed = |message: String| FetchError::Failed {
            path: path.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(failed(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_files_under_root() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("assets")).unwrap();
        std::fs::write(temp.path().join("assets/app.css"), "body{}").unwrap();

        let source = DirSource::new(temp.path());

        assert_eq!(source.fetch_text("assets/app.css").await.unwrap(), "body{}");
        assert_eq!(source.fetch_text("/assets/app.css").await.unwrap(), "body{}");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let source = DirSource::new(temp.path());

        assert!(matches!(
            source.fetch_bytes("nope.js").await,
            Err(FetchError::NotFound(path)) if path == "nope.js"
        ));
    }

    #[tokio::test]
    async fn refuses_paths_leaving_root() {
        let temp = TempDir::new().unwrap();
        let source = DirSource::new(temp.path());

        assert!(matches!(
            source.fetch_bytes("../secret").await,
            Err(FetchError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn binary_content_is_not_text() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("logo.png"), [0xff, 0xfe, 0x00]).unwrap();
        let source = DirSource::new(temp.path());

        assert_eq!(source.fetch_bytes("logo.png").await.unwrap().len(), 3);
        assert!(matches!(
            source.fetch_text("logo.png").await,
            Err(FetchError::NotText(_))
        ));
    }

    #[test]
    fn http_base_gets_trailing_slash() {
        let source = HttpSource::new("http://127.0.0.1:7777/bundle").unwrap();
        assert_eq!(source.base().as_str(), "http://127.0.0.1:7777/bundle/");
    }
}
