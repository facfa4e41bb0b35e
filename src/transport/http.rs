//! Reference HTTP server on Axum.
//!
//! # Responsibilities
//! - Bind eagerly so the endpoint is reportable before `start`
//! - Serve a user-supplied router plus a default `/healthz` route
//! - Shut down gracefully on the shared scope or an explicit `stop`

use std::net::SocketAddr;

use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::transport::{Server, TransportError};

/// HTTP server implementing the [`Server`] contract.
pub struct HttpServer {
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    router: Router,
    /// Internal stop signal, distinct from the orchestrator's scope.
    stopping: CancellationToken,
}

impl HttpServer {
    /// Bind with an empty router (only `/healthz`).
    pub async fn bind(address: &str) -> Result<Self, TransportError> {
        Self::bind_with_router(address, Router::new()).await
    }

    /// Bind the listener now; `endpoint()` is valid from here on. Use
    /// `"127.0.0.1:0"` to let the OS pick a port.
    pub async fn bind_with_router(address: &str, router: Router) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(address).await.map_err(|source| {
            TransportError::Bind {
                address: address.to_string(),
                source,
            }
        })?;
        let local_addr = listener.local_addr().map_err(|source| TransportError::Bind {
            address: address.to_string(),
            source,
        })?;
        Ok(Self {
            listener: Mutex::new(Some(listener)),
            local_addr,
            router: router.route("/healthz", get(healthz)),
            stopping: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[async_trait]
impl Server for HttpServer {
    async fn start(&self, shutdown: CancellationToken) -> Result<(), TransportError> {
        let listener = self
            .listener
            .lock()
            .await
            .take()
            .ok_or(TransportError::AlreadyStarted)?;
        tracing::info!(address = %self.local_addr, "HTTP server starting");

        let stopping = self.stopping.clone();
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = stopping.cancelled() => {}
                }
            })
            .await
            .map_err(TransportError::Serve)?;

        tracing::info!(address = %self.local_addr, "HTTP server stopped");
        Ok(())
    }

    /// Signals shutdown; in-flight connections drain inside `start`, which
    /// returns once they complete.
    async fn stop(&self) -> Result<(), TransportError> {
        self.stopping.cancel();
        Ok(())
    }

    fn endpoint(&self) -> Result<Option<Url>, TransportError> {
        let url = Url::parse(&format!("http://{}", self.local_addr))
            .map_err(|err| TransportError::Endpoint(err.to_string()))?;
        Ok(Some(url))
    }
}
