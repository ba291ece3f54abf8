//! HTTP transport.
//!
//! # Responsibilities
//! - Bind the configured address
//! - Serve the route table on a background task (`start`, non-blocking)
//! - Stop serving on `close`, used as the provider's release object
//!
//! # Design Decisions
//! - Binding happens in `start` so bind errors reach the caller
//! - Close errors are logged by the release, never propagated

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use thiserror::Error;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use crate::config::schema::ServiceConfig;
use crate::container::{BoxError, Release};
use crate::http::routes::RouteTable;
use crate::logf;
use crate::observability::logging::Logger;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind or configure the listening socket.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server already started")]
    AlreadyStarted,

    #[error("server is not running")]
    NotRunning,
}

#[derive(Default)]
struct Running {
    close_tx: Option<oneshot::Sender<()>>,
    local_addr: Option<SocketAddr>,
    started: bool,
}

/// HTTP server serving a route table.
///
/// Cheap to clone; clones control the same listener.
#[derive(Clone)]
pub struct HttpServer {
    bind_address: String,
    router: Router,
    running: Arc<Mutex<Running>>,
}

impl HttpServer {
    /// Create a server for `routes`. Nothing is bound yet.
    pub fn new(bind_address: impl Into<String>, routes: &RouteTable) -> Self {
        Self {
            bind_address: bind_address.into(),
            router: routes.router().layer(TraceLayer::new_for_http()),
            running: Arc::new(Mutex::new(Running::default())),
        }
    }

    /// Bind and begin serving on a background task.
    ///
    /// Must be called inside a Tokio runtime. Returns the bound address.
    pub fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.started {
            return Err(ServerError::AlreadyStarted);
        }

        let bind_err = |source| ServerError::Bind {
            address: self.bind_address.clone(),
            source,
        };
        let std_listener = std::net::TcpListener::bind(&self.bind_address).map_err(bind_err)?;
        std_listener.set_nonblocking(true).map_err(bind_err)?;
        let listener = tokio::net::TcpListener::from_std(std_listener).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        let (close_tx, close_rx) = oneshot::channel::<()>();
        let router = self.router.clone();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = close_rx.await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "Listen error");
            }
            tracing::info!(address = %local_addr, "HTTP server stopped");
        });

        running.close_tx = Some(close_tx);
        running.local_addr = Some(local_addr);
        running.started = true;

        tracing::info!(address = %local_addr, "HTTP server listening");
        Ok(local_addr)
    }

    /// Stop accepting connections; in-flight requests drain in the background.
    pub fn close(&self) -> Result<(), ServerError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        let close_tx = running.close_tx.take().ok_or(ServerError::NotRunning)?;
        // The serve task may already be gone; nothing left to stop then.
        let _ = close_tx.send(());
        tracing::info!(address = ?running.local_addr, "HTTP server closed");
        Ok(())
    }

    /// Address the server is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .close_tx
            .is_some()
    }
}

/// Release object closing the server at teardown.
pub struct ServerRelease {
    server: HttpServer,
}

impl Release for ServerRelease {
    fn release(self: Box<Self>) -> Result<(), BoxError> {
        if let Err(e) = self.server.close() {
            tracing::warn!(error = %e, "Server close error");
        }
        Ok(())
    }
}

/// Transport provider: the server plus the release that closes it.
pub fn new_server(
    config: Arc<ServiceConfig>,
    routes: Arc<RouteTable>,
) -> Result<(HttpServer, ServerRelease), ServerError> {
    let server = HttpServer::new(config.listener.bind_address.clone(), &routes);
    let release = ServerRelease {
        server: server.clone(),
    };
    Ok((server, release))
}

/// Bootstrap action: begin serving and announce the address.
pub fn start_server(server: Arc<HttpServer>, logger: Arc<dyn Logger>) -> Result<(), ServerError> {
    let addr = server.start()?;
    logf!(logger, "listening on {}", addr);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    fn routes() -> RouteTable {
        let mut routes = RouteTable::new();
        routes.handle("/ping", get(|| async { "pong" }));
        routes
    }

    #[tokio::test]
    async fn test_start_and_close() {
        let server = HttpServer::new("127.0.0.1:0", &routes());
        assert!(!server.is_running());

        let addr = server.start().unwrap();
        assert_ne!(addr.port(), 0);
        assert_eq!(server.local_addr(), Some(addr));
        assert!(matches!(server.start(), Err(ServerError::AlreadyStarted)));

        server.close().unwrap();
        assert!(!server.is_running());
        assert!(matches!(server.close(), Err(ServerError::NotRunning)));
    }

    #[tokio::test]
    async fn test_bind_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let address = taken.local_addr().unwrap().to_string();
        let server = HttpServer::new(address, &routes());
        assert!(matches!(server.start(), Err(ServerError::Bind { .. })));
    }

    #[test]
    fn test_release_swallows_close_error() {
        let release = Box::new(ServerRelease {
            server: HttpServer::new("127.0.0.1:0", &routes()),
        });
        assert!(release.release().is_ok());
    }
}
