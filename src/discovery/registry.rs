//! Registry facade: registrar + discovery over one backend.
//!
//! # Responsibilities
//! - Map service names to `ServiceSet`s and hand out watchers
//! - Run one resolver task per watched name
//! - Forward register/deregister to the backend client
//!
//! # Design Decisions
//! - Name map behind an RwLock: watch registrations are frequent and take
//!   the read path; set creation is rare and takes the write path
//! - Resolver tasks live for the process lifetime. Sets are never
//!   garbage-collected, an accepted leak-on-churn trade-off: one idle task
//!   per service name ever watched

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::discovery::backend::RegistryBackend;
use crate::discovery::client::{RegistryClient, DEFAULT_HEALTH_CHECK_INTERVAL};
use crate::discovery::service_set::ServiceSet;
use crate::discovery::watcher::ServiceWatcher;
use crate::registry::{Discovery, Registrar, RegistryError, ServiceInstance, Watcher};

/// Deadline for the synchronous query serving first watchers.
const INITIAL_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Outer bound on one resolver long-poll round trip.
const QUERY_DEADLINE: Duration = Duration::from_secs(120);

/// Resolver loop cadence.
const RESOLVE_TICK: Duration = Duration::from_secs(1);

/// Backoff after a failed query, index not advanced.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Tunables for [`Registry`].
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Renew a TTL check from this process (passive liveness).
    pub heartbeat: bool,
    /// Attach backend-driven TCP probes per endpoint (active liveness).
    pub enable_health_check: bool,
    /// Probe interval; also scales the TTL and heartbeat cadence.
    pub health_check_interval: Duration,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            heartbeat: true,
            enable_health_check: true,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
        }
    }
}

/// Registrar and discovery facade over a [`RegistryBackend`].
pub struct Registry {
    client: Arc<RegistryClient>,
    sets: RwLock<HashMap<String, Arc<ServiceSet>>>,
    enable_health_check: bool,
}

impl Registry {
    pub fn new(backend: Arc<dyn RegistryBackend>) -> Self {
        Self::with_options(backend, RegistryOptions::default())
    }

    pub fn with_options(backend: Arc<dyn RegistryBackend>, options: RegistryOptions) -> Self {
        let mut client = RegistryClient::new(backend);
        client.heartbeat = options.heartbeat;
        client.health_check_interval = options.health_check_interval;
        Self {
            client: Arc::new(client),
            sets: RwLock::new(HashMap::new()),
            enable_health_check: options.enable_health_check,
        }
    }

    /// Get-or-create the set for a name. Returns whether it was created.
    fn service_set(&self, name: &str) -> (Arc<ServiceSet>, bool) {
        if let Some(set) = self.sets.read().unwrap().get(name) {
            return (set.clone(), false);
        }
        let mut sets = self.sets.write().unwrap();
        match sets.get(name) {
            Some(set) => (set.clone(), false),
            None => {
                let set = Arc::new(ServiceSet::new(name.to_string()));
                sets.insert(name.to_string(), set.clone());
                (set, true)
            }
        }
    }

    /// One bounded query so the first watchers see current membership, then
    /// the resolver loop: long-poll with the last index, adopt the index on
    /// every success, swap and broadcast the list only on an actual change
    /// signal (index moved and list non-empty).
    async fn start_resolver(&self, set: Arc<ServiceSet>) {
        let client = self.client.clone();
        let mut index = 0;
        match timeout(INITIAL_QUERY_TIMEOUT, client.query(&set.service_name, 0, true)).await {
            Ok(Ok((services, idx))) => {
                index = idx;
                if !services.is_empty() {
                    set.broadcast(services);
                }
            }
            Ok(Err(err)) => {
                tracing::warn!(service = %set.service_name, error = %err, "initial discovery query failed");
            }
            Err(_) => {
                tracing::warn!(service = %set.service_name, "initial discovery query timed out");
            }
        }

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(RESOLVE_TICK);
            loop {
                ticker.tick().await;
                match timeout(QUERY_DEADLINE, client.query(&set.service_name, index, true)).await {
                    Ok(Ok((services, idx))) => {
                        if idx != index && !services.is_empty() {
                            tracing::debug!(
                                service = %set.service_name,
                                instances = services.len(),
                                index = idx,
                                "membership changed, broadcasting"
                            );
                            set.broadcast(services);
                        }
                        index = idx;
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(service = %set.service_name, error = %err, "discovery query failed, retrying");
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                    Err(_) => {
                        tracing::warn!(service = %set.service_name, "discovery query timed out, retrying");
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        });
    }
}

#[async_trait]
impl Registrar for Registry {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        self.client.register(instance, self.enable_health_check).await
    }

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        self.client.deregister(&instance.id).await
    }
}

#[async_trait]
impl Discovery for Registry {
    async fn get_service(&self, service_name: &str) -> Result<Vec<ServiceInstance>, RegistryError> {
        let (services, _) = timeout(INITIAL_QUERY_TIMEOUT, self.client.query(service_name, 0, true))
            .await
            .map_err(|_| RegistryError::Timeout(INITIAL_QUERY_TIMEOUT))??;
        Ok(services)
    }

    async fn watch(&self, service_name: &str) -> Result<Arc<dyn Watcher>, RegistryError> {
        let (set, created) = self.service_set(service_name);
        let watcher = Arc::new(ServiceWatcher::new(set.clone()));
        if created {
            self.start_resolver(set).await;
        }
        Ok(watcher)
    }
}
