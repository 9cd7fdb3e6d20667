//! Embedded web server exposing the HTTP/WebSocket surface.
//!
//! The web layer is thin plumbing over the core: every handler reads the
//! store, drives a transport state machine, or registers with the hub, and
//! renders the result onto the wire. No core component depends on anything
//! in this module.
//!
//! ## Routes
//!
//! | Route | Transport |
//! |-------|-----------|
//! | `GET /api/hello` | one-shot pull |
//! | `GET /api/hello/stream` | push stream (SSE) |
//! | `GET /api/hello/live` | long poll (NDJSON, 60s deadline) |
//! | `GET /api/status` | status report |
//! | `GET /ws` | publish/subscribe (WebSocket) |
//! | anything else | embedded demo page |

use std::future::Future;
use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::{Error, Result};

pub mod assets;
pub mod handlers;
pub mod live;
pub mod sse;
pub mod state;
pub mod ws;

pub use state::{DeliveryOptions, SharedState};

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Bind to localhost only
    pub localhost_only: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            port: crate::DEFAULT_SERVER_PORT,
            localhost_only: false,
        }
    }
}

/// The embedded web server.
pub struct WebServer {
    config: WebServerConfig,
}

impl WebServer {
    /// Create a server with the given configuration.
    #[must_use]
    pub fn new(config: WebServerConfig) -> Self {
        Self { config }
    }

    /// Build the router over the shared state.
    ///
    /// Exposed separately so tests can drive the routes without a socket.
    #[must_use]
    pub fn router(state: SharedState) -> Router {
        Router::new()
            .route("/api/hello", get(handlers::get_content))
            .route("/api/hello/stream", get(sse::stream_content))
            .route("/api/hello/live", get(live::live_content))
            .route("/api/status", get(handlers::get_status))
            .route("/ws", get(ws::ws_upgrade))
            .fallback(assets::serve_static_fallback)
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind and serve until the shutdown future resolves.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the listen address is unavailable and
    /// [`Error::Server`] if serving fails afterwards.
    pub async fn serve<F>(self, state: SharedState, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let host = if self.config.localhost_only {
            [127, 0, 0, 1]
        } else {
            [0, 0, 0, 0]
        };
        let addr = SocketAddr::from((host, self.config.port));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Bind {
                addr: addr.to_string(),
                source: e,
            })?;

        tracing::info!("listening on http://{addr}");

        axum::serve(listener, Self::router(state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Server(e.to_string()))
    }
}
