//! Backend adapter client.
//!
//! # Responsibilities
//! - Translate a `ServiceInstance` into a backend registration with health
//!   checks (TCP probes per endpoint, TTL heartbeat per instance)
//! - Run the heartbeat renewal task until the client scope is cancelled
//! - Issue long-poll queries and resolve entries back into instances
//!
//! # Design Decisions
//! - Renewal failures are logged, never retried locally: the backend's own
//!   TTL grace period is the failure path
//! - `deregister` cancels the client scope first so heartbeats stop before
//!   the backend forgets the instance

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::discovery::backend::{
    HealthCheck, RegistryBackend, ServiceEntry, ServiceRegistration,
};
use crate::registry::{RegistryError, ServiceInstance};

/// Default interval for backend-driven TCP probes.
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Per-probe timeout for TCP checks.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Critical registrations are dropped after this many intervals.
const DEREGISTER_GRACE_MULTIPLE: u32 = 60;

/// Delay before the first TTL pass, so the registration has landed.
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Wait window for one long-poll query.
const LONG_POLL_WAIT: Duration = Duration::from_secs(55);

/// Tagged-address schemes that alias the primary address rather than
/// advertising a real endpoint.
const ALIAS_SCHEMES: [&str; 4] = ["lan_ipv4", "wan_ipv4", "lan_ipv6", "wan_ipv6"];

/// Low-level client over a [`RegistryBackend`].
pub struct RegistryClient {
    backend: Arc<dyn RegistryBackend>,
    /// Scope for background heartbeat tasks; cancelled on deregister.
    scope: CancellationToken,
    pub(crate) health_check_interval: Duration,
    pub(crate) heartbeat: bool,
}

impl RegistryClient {
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self {
            backend,
            scope: CancellationToken::new(),
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
            heartbeat: true,
        }
    }

    /// Register the instance, attaching one TCP probe per endpoint when
    /// `enable_health_check` is set and a TTL heartbeat check when the client
    /// heartbeats. On success the renewal task is spawned under the client
    /// scope.
    pub async fn register(
        &self,
        instance: &ServiceInstance,
        enable_health_check: bool,
    ) -> Result<(), RegistryError> {
        if instance.id.is_empty() {
            return Err(RegistryError::InvalidInstance("empty instance id".into()));
        }

        let mut tagged_addresses = HashMap::new();
        let mut check_addresses = Vec::with_capacity(instance.endpoints.len());
        for endpoint in &instance.endpoints {
            let raw = Url::parse(endpoint).map_err(|err| {
                RegistryError::InvalidInstance(format!("endpoint {endpoint}: {err}"))
            })?;
            let host = raw.host_str().ok_or_else(|| {
                RegistryError::InvalidInstance(format!("endpoint {endpoint}: missing host"))
            })?;
            let port = raw.port_or_known_default().ok_or_else(|| {
                RegistryError::InvalidInstance(format!("endpoint {endpoint}: missing port"))
            })?;
            check_addresses.push(format!("{host}:{port}"));
            tagged_addresses.insert(raw.scheme().to_string(), endpoint.clone());
        }

        let mut checks = Vec::new();
        if enable_health_check {
            for address in &check_addresses {
                checks.push(HealthCheck::Tcp {
                    address: address.clone(),
                    interval: self.health_check_interval,
                    timeout: PROBE_TIMEOUT,
                    deregister_after: self.health_check_interval * DEREGISTER_GRACE_MULTIPLE,
                });
            }
        }
        if self.heartbeat {
            checks.push(HealthCheck::Ttl {
                check_id: ttl_check_id(&instance.id),
                // One renewal tick (2x interval) plus headroom.
                ttl: self.health_check_interval * 3,
                deregister_after: self.health_check_interval * DEREGISTER_GRACE_MULTIPLE,
            });
        }

        self.backend
            .register(ServiceRegistration {
                id: instance.id.clone(),
                name: instance.name.clone(),
                tags: vec![format!("version={}", instance.version)],
                metadata: instance.metadata.clone(),
                tagged_addresses,
                checks,
            })
            .await
            .map_err(|err| RegistryError::Backend(err.to_string()))?;

        if self.heartbeat {
            self.spawn_heartbeat(ttl_check_id(&instance.id));
        }
        Ok(())
    }

    fn spawn_heartbeat(&self, check_id: String) {
        let backend = self.backend.clone();
        let scope = self.scope.clone();
        let tick = self.health_check_interval * 2;
        tokio::spawn(async move {
            tokio::time::sleep(SETTLE_DELAY).await;
            if let Err(err) = backend.update_ttl(&check_id, "pass").await {
                tracing::error!(check_id = %check_id, error = %err, "TTL renewal failed");
            }
            let mut ticker = tokio::time::interval(tick);
            // The first tick completes immediately; consume it.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = backend.update_ttl(&check_id, "pass").await {
                            tracing::error!(check_id = %check_id, error = %err, "TTL renewal failed");
                        }
                    }
                    _ = scope.cancelled() => {
                        tracing::debug!(check_id = %check_id, "heartbeat loop stopped");
                        return;
                    }
                }
            }
        });
    }

    /// Cancel the heartbeat scope and remove the registration. The backend
    /// error, if any, is returned verbatim.
    pub async fn deregister(&self, service_id: &str) -> Result<(), RegistryError> {
        self.scope.cancel();
        self.backend
            .deregister(service_id)
            .await
            .map_err(|err| RegistryError::Backend(err.to_string()))
    }

    /// One long-poll query bounded by the fixed wait window, resolved into
    /// service instances.
    pub async fn query(
        &self,
        service_name: &str,
        last_index: u64,
        passing_only: bool,
    ) -> Result<(Vec<ServiceInstance>, u64), RegistryError> {
        let (entries, index) = self
            .backend
            .health_service(service_name, last_index, LONG_POLL_WAIT, passing_only)
            .await
            .map_err(|err| RegistryError::Backend(err.to_string()))?;
        Ok((resolve_entries(entries), index))
    }
}

fn ttl_check_id(service_id: &str) -> String {
    format!("service:{service_id}")
}

/// Map backend entries to instances: version comes from the `version=<v>`
/// tag, endpoints are every tagged address except the well-known aliases.
fn resolve_entries(entries: Vec<ServiceEntry>) -> Vec<ServiceInstance> {
    entries
        .into_iter()
        .map(|entry| {
            let version = entry
                .tags
                .iter()
                .find_map(|tag| match tag.split_once('=') {
                    Some(("version", value)) => Some(value.to_string()),
                    _ => None,
                })
                .unwrap_or_default();
            let mut endpoints: Vec<String> = entry
                .tagged_addresses
                .iter()
                .filter(|(scheme, _)| !ALIAS_SCHEMES.contains(&scheme.as_str()))
                .map(|(_, address)| address.clone())
                .collect();
            endpoints.sort();
            ServiceInstance {
                id: entry.id,
                name: entry.service,
                version,
                metadata: entry.metadata,
                endpoints,
            }
        })
        .collect()
}
