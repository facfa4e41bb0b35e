//! Registry backend contract.
//!
//! # Responsibilities
//! - Define the operations a registry backend must support
//! - Describe registrations, health checks, and reported entries
//!
//! # Design Decisions
//! - Long-poll is part of the contract: `health_service` returns early on
//!   change, or after the wait window with the unchanged index (not an error)
//! - The consistency index is opaque; callers only compare for equality

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a registry backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    #[error("unknown service id: {0}")]
    UnknownService(String),

    #[error("unknown check id: {0}")]
    UnknownCheck(String),
}

/// One health check attached to a registration.
#[derive(Debug, Clone)]
pub enum HealthCheck {
    /// Active TCP reachability probe run by the backend.
    Tcp {
        /// `host:port` to probe.
        address: String,
        /// Probe interval.
        interval: Duration,
        /// Per-probe timeout.
        timeout: Duration,
        /// Remove the registration after this long in critical state.
        deregister_after: Duration,
    },

    /// Passive TTL check renewed by the instance itself. Absence of renewal
    /// beyond the TTL marks the instance unhealthy.
    Ttl {
        /// Check id, keyed by instance (`service:<id>`).
        check_id: String,
        /// Renewal deadline.
        ttl: Duration,
        /// Remove the registration after this long in critical state.
        deregister_after: Duration,
    },
}

/// A registration as submitted to the backend.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistration {
    pub id: String,
    pub name: String,
    /// Free-form tags; the version travels as `version=<value>`.
    pub tags: Vec<String>,
    pub metadata: HashMap<String, String>,
    /// Advertised endpoint per URI scheme.
    pub tagged_addresses: HashMap<String, String>,
    pub checks: Vec<HealthCheck>,
}

/// A service entry as the backend reports it back.
#[derive(Debug, Clone)]
pub struct ServiceEntry {
    pub id: String,
    pub service: String,
    pub tags: Vec<String>,
    pub metadata: HashMap<String, String>,
    pub tagged_addresses: HashMap<String, String>,
}

/// Operations a registry backend must satisfy.
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Create or replace a registration.
    async fn register(&self, registration: ServiceRegistration) -> Result<(), BackendError>;

    /// Remove a registration by service id.
    async fn deregister(&self, service_id: &str) -> Result<(), BackendError>;

    /// Renew a passive TTL check.
    async fn update_ttl(&self, check_id: &str, note: &str) -> Result<(), BackendError>;

    /// Long-poll query for a service name. Returns the entries and the new
    /// consistency index. When nothing changes within `wait`, returns the
    /// current entries with the index unchanged.
    async fn health_service(
        &self,
        service_name: &str,
        wait_index: u64,
        wait: Duration,
        passing_only: bool,
    ) -> Result<(Vec<ServiceEntry>, u64), BackendError>;
}
