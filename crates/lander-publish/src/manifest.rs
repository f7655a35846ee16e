//! The bundle manifest.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// File name of the manifest at the bundle root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Every file of a bundle, relative to its root, with forward slashes.
///
/// The manifest never lists itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<String>,
}

impl Manifest {
    /// Collect the files under `root` in sorted order.
    pub fn scan(root: &Path) -> io::Result<Self> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if path != MANIFEST_FILE {
                files.push(path);
            }
        }

        files.sort();
        Ok(Self { files })
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the manifest as `manifest.json` under `root`.
    pub fn write(&self, root: &Path) -> io::Result<()> {
        let json = self
            .to_json_pretty()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(root.join(MANIFEST_FILE), json)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn scans_sorted_relative_paths_without_itself() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("_next/static")).unwrap();
        fs::write(root.join("index.html"), "").unwrap();
        fs::write(root.join("_next/static/app.js"), "").unwrap();
        fs::write(root.join("favicon.ico"), "").unwrap();
        fs::write(root.join(MANIFEST_FILE), "{}").unwrap();

        let manifest = Manifest::scan(root).unwrap();

        assert_eq!(
            manifest.files,
            vec!["_next/static/app.js", "favicon.ico", "index.html"]
        );
    }

    #[test]
    fn writes_pretty_files_document() {
        let temp = TempDir::new().unwrap();
        let manifest = Manifest {
            files: vec!["index.html".to_string()],
        };

        manifest.write(temp.path()).unwrap();

        let written = fs::read_to_string(temp.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(written, "{\n  \"files\": [\n    \"index.html\"\n  ]\n}");
        assert_eq!(Manifest::parse(&written).unwrap(), manifest);
    }
}
