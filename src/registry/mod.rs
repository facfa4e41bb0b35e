//! Service registry contracts.
//!
//! # Data Flow
//! ```text
//! App (lifecycle)
//!     → Registrar::register(ServiceInstance)   on successful startup
//!     → Registrar::deregister(ServiceInstance) on shutdown
//!
//! Consumers
//!     → Discovery::watch(name) → Watcher
//!     → Watcher::next() blocks until membership changes
//! ```
//!
//! # Design Decisions
//! - Contracts only; the long-poll reference implementation lives in `discovery`
//! - Traits are object-safe so backends can be swapped behind `Arc<dyn _>`
//! - An instance with an empty id is invalid everywhere, by contract

pub mod types;

pub use types::ServiceInstance;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by registrars, discovery, and watchers.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The backend rejected or failed the operation.
    #[error("registry backend error: {0}")]
    Backend(String),

    /// The instance cannot be registered as described.
    #[error("invalid service instance: {0}")]
    InvalidInstance(String),

    /// The watcher was stopped; no further updates will arrive.
    #[error("watch stopped")]
    WatchStopped,

    /// The operation did not complete within its deadline.
    #[error("registry operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Records instance liveness in an external registry.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Register the instance. Must reject an empty instance id.
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError>;

    /// Remove the instance from the registry.
    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), RegistryError>;
}

/// Read side of the registry: lookups and change subscriptions.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Return the currently known instances for a service name.
    async fn get_service(&self, service_name: &str) -> Result<Vec<ServiceInstance>, RegistryError>;

    /// Subscribe to membership changes for a service name.
    async fn watch(&self, service_name: &str) -> Result<Arc<dyn Watcher>, RegistryError>;
}

/// Consumer-side handle receiving membership change notifications.
///
/// Handles are shared (`Arc`) so a pending `next()` on one task can be
/// unblocked by `stop()` from another.
#[async_trait]
pub trait Watcher: Send + Sync {
    /// Block until the first non-empty instance list is known or any change
    /// is observed, then return the latest snapshot. Returns
    /// [`RegistryError::WatchStopped`] once the watcher is stopped. Callers
    /// that need a deadline wrap this in `tokio::time::timeout`.
    async fn next(&self) -> Result<Vec<ServiceInstance>, RegistryError>;

    /// Stop the watcher, unblocking any pending `next()`. Idempotent.
    fn stop(&self);
}
