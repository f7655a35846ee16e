//! Watching the imported configuration file.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Watches one configuration file and reports when it changes.
///
/// The parent directory is watched rather than the file itself so editors
/// that save by writing a new file and renaming it over the old one are
/// still picked up.
pub struct ConfigWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Watch `path`. Each change is delivered on the returned channel.
    pub fn new(path: &Path) -> Result<(Self, async_mpsc::Receiver<PathBuf>), std::io::Error> {
        let path = path.canonicalize()?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| std::io::Error::other("configuration file has no parent directory"))?;

        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(16);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(std::io::Error::other)?;

        let target = path.clone();
        std::thread::spawn(move || {
            let quiet = Duration::from_millis(100);
            let mut deadline = None::<Instant>;

            loop {
                // Report once the file has been quiet for `quiet`.
                let event = match deadline {
                    Some(at) => {
                        let wait = at.saturating_duration_since(Instant::now());
                        match sync_rx.recv_timeout(wait) {
                            Ok(event) => event,
                            Err(RecvTimeoutError::Timeout) => {
                                deadline = None;
                                if async_tx.blocking_send(target.clone()).is_err() {
                                    break;
                                }
                                continue;
                            }
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                    None => match sync_rx.recv() {
                        Ok(event) => event,
                        Err(_) => break,
                    },
                };

                if is_change_to(&event, &target) {
                    deadline = Some(Instant::now() + quiet);
                }
            }
        });

        Ok((
            Self {
                path,
                _watcher: watcher,
            },
            async_rx,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_change_to(event: &notify::Event, target: &Path) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    // Only the target's directory is watched, so the name is enough.
    event.paths.iter().any(|p| p.file_name() == target.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reports_changes_to_watched_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("landing.json");
        fs::write(&file, "{}").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&file).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(100)).await;

        fs::write(&file, r#"{"hero":{}}"#).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;
        drop(watcher);

        assert!(event.is_ok(), "timeout waiting for file watch event");
        assert_eq!(event.unwrap(), Some(file.canonicalize().unwrap()));
    }

    #[tokio::test]
    async fn quick_successive_writes_report_final_content_once() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("landing.json");
        fs::write(&file, "{}").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&file).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // An editor saving in two steps: truncate, then write.
        fs::write(&file, "").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        fs::write(&file, r#"{"hero":{"headline":"Final"}}"#).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("timeout waiting for file watch event");
        let path = event.unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"{"hero":{"headline":"Final"}}"#
        );

        let again = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
        drop(watcher);
        assert!(again.is_err(), "a single save should be reported once");
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = tempdir().unwrap();
        assert!(ConfigWatcher::new(&temp.path().join("nope.json")).is_err());
    }
}
