//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so a minimal (or empty) config is valid.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the bootstrap runtime.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Service identity and advertised endpoints.
    pub service: ServiceConfig,

    /// HTTP transport settings.
    pub http: HttpConfig,

    /// Lifecycle timeouts.
    pub timeouts: TimeoutConfig,

    /// Registry/discovery settings.
    pub discovery: DiscoveryConfig,
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Instance id; generated when absent.
    pub id: Option<String>,

    /// Service name as registered.
    pub name: String,

    /// Version advertised to the registry.
    pub version: String,

    /// Key/value metadata attached to the instance.
    pub metadata: HashMap<String, String>,

    /// Explicit endpoint URIs; when empty, endpoints are derived from the
    /// configured servers.
    pub endpoints: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            id: None,
            name: "svckit".to_string(),
            version: "0.1.0".to_string(),
            metadata: HashMap::new(),
            endpoints: Vec::new(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g. "127.0.0.1:8000"; port 0 picks a free port).
    pub bind_address: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Lifecycle timeouts, in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on the registration call at startup.
    pub registrar_secs: u64,

    /// Bound on each server's stop call at shutdown.
    pub stop_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            registrar_secs: 10,
            stop_secs: 10,
        }
    }
}

/// Registry/discovery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Renew a TTL check from this process.
    pub heartbeat: bool,

    /// Attach backend-driven TCP probes per endpoint.
    pub health_check: bool,

    /// Probe interval in seconds.
    pub health_check_interval_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            heartbeat: true,
            health_check: true,
            health_check_interval_secs: 10,
        }
    }
}
