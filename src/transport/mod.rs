//! Transport server contract.
//!
//! # Design Decisions
//! - Servers are a closed capability interface: start, stop, and an optional
//!   endpoint report; the orchestrator holds them as `Arc<dyn Server>`
//! - `start` observes the shared shutdown scope so cancellation unwinds a
//!   blocked serve loop
//! - `stop` is best-effort graceful; the orchestrator bounds it with the
//!   configured stop timeout

pub mod http;

pub use http::HttpServer;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bind {address} failed: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("serve failed: {0}")]
    Serve(std::io::Error),

    #[error("server already started")]
    AlreadyStarted,

    #[error("endpoint unavailable: {0}")]
    Endpoint(String),
}

/// A network-facing server component managed by the lifecycle orchestrator.
#[async_trait]
pub trait Server: Send + Sync {
    /// Serve until stopped or `shutdown` is cancelled. Returns `Ok` on a
    /// clean stop.
    async fn start(&self, shutdown: CancellationToken) -> Result<(), TransportError>;

    /// Trigger a graceful stop. The caller bounds the call with a deadline.
    async fn stop(&self) -> Result<(), TransportError>;

    /// Bound address as a URI, for transports that can report one.
    fn endpoint(&self) -> Result<Option<Url>, TransportError> {
        Ok(None)
    }
}
