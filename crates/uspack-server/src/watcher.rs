//! File watcher for detecting source changes during a watch session.
//!
//! Watches the project source tree and the metadata descriptor; every
//! debounced change triggers a full rebuild in the watch loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::{DebounceEventResult, new_debouncer, notify::RecursiveMode};
use tokio::sync::mpsc;

use crate::error::{ServerError, ServerResult};

/// Extensions that participate in a build.
const WATCHED_EXTENSIONS: &[&str] = &["js", "comp", "json", "css"];

/// File change event.
#[derive(Debug, Clone)]
pub enum FileEvent {
    /// File was modified or created.
    Modified(PathBuf),
    /// File was removed.
    Removed(PathBuf),
}

/// File watcher handle.
pub struct FileWatcher {
    /// Debouncer handle (kept alive to maintain watcher).
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    /// Receiver for file events.
    rx: mpsc::UnboundedReceiver<FileEvent>,
}

impl FileWatcher {
    /// Watch `dir` recursively for source changes.
    pub fn new(dir: impl AsRef<Path>) -> ServerResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let (tx, rx) = mpsc::unbounded_channel();

        let mut debouncer = new_debouncer(
            Duration::from_millis(200),
            move |result: DebounceEventResult| {
                if let Ok(events) = result {
                    for event in events {
                        let path = &event.path;

                        let watched = path
                            .extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| WATCHED_EXTENSIONS.contains(&e));
                        if !watched {
                            continue;
                        }

                        let file_event = if path.exists() {
                            FileEvent::Modified(path.clone())
                        } else {
                            FileEvent::Removed(path.clone())
                        };
                        let _ = tx.send(file_event);
                    }
                }
            },
        )
        .map_err(|e| ServerError::Watch(e.to_string()))?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::Recursive)
            .map_err(|e| ServerError::Watch(e.to_string()))?;

        Ok(Self {
            _debouncer: debouncer,
            rx,
        })
    }

    /// Receive the next file event.
    pub async fn recv(&mut self) -> Option<FileEvent> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_watcher_creation() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("main.js"), "// source").unwrap();

        let watcher = FileWatcher::new(temp.path());
        assert!(watcher.is_ok());
    }

    #[tokio::test]
    async fn test_watcher_missing_dir_fails() {
        let watcher = FileWatcher::new("/nonexistent/uspack-src");
        assert!(matches!(watcher, Err(ServerError::Watch(_))));
    }
}
