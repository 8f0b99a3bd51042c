//! uspack development server.
//!
//! Serves the project's `public/` directory and pushes reload notifications
//! to connected pages over a `/livereload` WebSocket.
//!
//! # Architecture
//!
//! - **Session**: the per-watch-session state machine that starts the
//!   server once and broadcasts reloads
//! - **Watcher**: debounced file system monitoring of the source tree
//! - The HTTP surface itself is static file service plus the WebSocket

pub mod error;
pub mod session;
pub mod watcher;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

pub use error::{ServerError, ServerResult};
pub use session::{DevSession, SessionState};
pub use watcher::{FileEvent, FileWatcher};

/// Broadcast payload telling clients to refresh.
#[derive(Debug, Clone, Copy)]
pub struct ReloadSignal;

/// Dev server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory served at the root.
    pub public_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 35729,
            public_dir: PathBuf::from("public"),
        }
    }
}

/// Run the dev server until the process exits.
///
/// `reload_tx` is shared with the watch loop; every broadcast is forwarded
/// to all connected WebSocket clients.
pub async fn serve(
    config: ServerConfig,
    reload_tx: broadcast::Sender<ReloadSignal>,
) -> ServerResult<()> {
    let app = create_router(&config.public_dir, reload_tx);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| ServerError::Bind {
            addr: format!("{}:{}", config.host, config.port),
            message: "invalid address".to_string(),
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;

    let local = listener.local_addr()?;
    tracing::info!("dev server listening at http://{local}");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Static file service plus the livereload WebSocket.
pub fn create_router(public_dir: &Path, reload_tx: broadcast::Sender<ReloadSignal>) -> Router {
    Router::new()
        .route("/livereload", get(livereload))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(reload_tx)
}

async fn livereload(
    ws: WebSocketUpgrade,
    State(reload_tx): State<broadcast::Sender<ReloadSignal>>,
) -> impl IntoResponse {
    let rx = reload_tx.subscribe();
    ws.on_upgrade(move |socket| client_loop(socket, rx))
}

/// Forward reload broadcasts to one client until it disconnects.
async fn client_loop(mut socket: WebSocket, mut rx: broadcast::Receiver<ReloadSignal>) {
    loop {
        match rx.recv().await {
            Ok(ReloadSignal) => {
                if socket.send(Message::Text("reload".into())).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                // Reloads are idempotent; collapsing a burst into one is fine.
                tracing::debug!(missed, "client lagged behind reload broadcasts");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 35729);
        assert_eq!(config.public_dir, PathBuf::from("public"));
    }
}
