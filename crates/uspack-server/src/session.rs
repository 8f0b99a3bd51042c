//! Development session state machine.
//!
//! One watch session owns one [`DevSession`]. The first successful artifact
//! write moves it from `NotStarted` to `Running` and spawns the long-lived
//! dev server exactly once; later writes only broadcast a reload. The
//! spawned server is never torn down explicitly; it lives until the watch
//! process exits.

use tokio::sync::broadcast;

use crate::{ReloadSignal, ServerConfig};

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No artifact has been written yet; the server is not running.
    NotStarted,
    /// The server task has been spawned.
    Running,
}

/// Per-watch-session dev server handle.
#[derive(Debug)]
pub struct DevSession {
    state: SessionState,
    config: ServerConfig,
    reload_tx: broadcast::Sender<ReloadSignal>,
}

impl DevSession {
    /// A fresh, not-yet-started session.
    pub fn new(config: ServerConfig) -> Self {
        let (reload_tx, _) = broadcast::channel(16);
        Self {
            state: SessionState::NotStarted,
            config,
            reload_tx,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Start the dev server if this session has not started it yet.
    ///
    /// Returns `true` if this call spawned the server, `false` if it was
    /// already running. A bind failure inside the spawned task is logged
    /// and does not fail the build pass; the artifact is already on disk.
    pub fn ensure_started(&mut self) -> bool {
        if self.state == SessionState::Running {
            return false;
        }

        let config = self.config.clone();
        let reload_tx = self.reload_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = crate::serve(config, reload_tx).await {
                tracing::error!("dev server failed to start: {e}");
            }
        });

        self.state = SessionState::Running;
        true
    }

    /// Tell connected clients to reload.
    ///
    /// Idempotent per write; having no connected clients is not an error.
    /// Returns the number of clients notified.
    pub fn notify_reload(&self) -> usize {
        self.reload_tx.send(ReloadSignal).unwrap_or(0)
    }

    /// Subscribe to reload broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadSignal> {
        self.reload_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> ServerConfig {
        let public = dir.path().join("public");
        fs::create_dir_all(&public).unwrap();
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_dir: public,
        }
    }

    #[tokio::test]
    async fn test_server_starts_exactly_once_across_three_writes() {
        let dir = TempDir::new().unwrap();
        let mut session = DevSession::new(config(&dir));
        let mut rx = session.subscribe();

        assert_eq!(session.state(), SessionState::NotStarted);

        // Three consecutive successful writes.
        let mut starts = 0;
        let mut reloads = 0;
        for _ in 0..3 {
            if session.ensure_started() {
                starts += 1;
            }
            reloads += session.notify_reload();
        }

        assert_eq!(starts, 1);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(reloads, 3);

        for _ in 0..3 {
            rx.recv().await.unwrap();
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reload_without_clients_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let session = DevSession::new(config(&dir));
        assert_eq!(session.notify_reload(), 0);
    }
}
