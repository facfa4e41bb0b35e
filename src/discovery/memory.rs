//! In-memory registry backend.
//!
//! # Responsibilities
//! - Satisfy the `RegistryBackend` contract without external infrastructure
//! - Back the integration tests and the self-contained demo binary
//!
//! # Design Decisions
//! - Consistency index is a single counter bumped on any mutation; it starts
//!   at 1 so a first query with index 0 returns immediately
//! - Long-poll wakes through a `Notify`; the wait window is honored with the
//!   unchanged index when nothing happens
//! - `passing_only` is accepted but not simulated; every registered entry is
//!   reported passing
//! - TTL passes are counted per check id so heartbeat behavior is observable

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Notify;

use crate::discovery::backend::{
    BackendError, HealthCheck, RegistryBackend, ServiceEntry, ServiceRegistration,
};

pub struct MemoryBackend {
    services: DashMap<String, ServiceRegistration>,
    index: AtomicU64,
    changed: Notify,
    ttl_passes: DashMap<String, u64>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
            index: AtomicU64::new(1),
            changed: Notify::new(),
            ttl_passes: DashMap::new(),
        }
    }

    /// Number of `pass` renewals recorded for a TTL check id.
    pub fn ttl_passes(&self, check_id: &str) -> u64 {
        self.ttl_passes.get(check_id).map(|c| *c).unwrap_or(0)
    }

    /// Registered ids for a service name, in registration-table order.
    pub fn service_ids(&self, service_name: &str) -> Vec<String> {
        self.services
            .iter()
            .filter(|entry| entry.value().name == service_name)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    fn bump(&self) {
        self.index.fetch_add(1, Ordering::SeqCst);
        self.changed.notify_waiters();
    }

    fn entries_for(&self, service_name: &str) -> Vec<ServiceEntry> {
        self.services
            .iter()
            .filter(|entry| entry.value().name == service_name)
            .map(|entry| {
                let reg = entry.value();
                ServiceEntry {
                    id: reg.id.clone(),
                    service: reg.name.clone(),
                    tags: reg.tags.clone(),
                    metadata: reg.metadata.clone(),
                    tagged_addresses: reg.tagged_addresses.clone(),
                }
            })
            .collect()
    }

    fn has_check(&self, check_id: &str) -> bool {
        self.services.iter().any(|entry| {
            entry.value().checks.iter().any(|check| {
                matches!(check, HealthCheck::Ttl { check_id: id, .. } if id == check_id)
            })
        })
    }
}

#[async_trait]
impl RegistryBackend for MemoryBackend {
    async fn register(&self, registration: ServiceRegistration) -> Result<(), BackendError> {
        if registration.id.is_empty() {
            return Err(BackendError::InvalidRegistration("missing service id".into()));
        }
        self.services.insert(registration.id.clone(), registration);
        self.bump();
        Ok(())
    }

    async fn deregister(&self, service_id: &str) -> Result<(), BackendError> {
        self.services
            .remove(service_id)
            .ok_or_else(|| BackendError::UnknownService(service_id.to_string()))?;
        self.bump();
        Ok(())
    }

    async fn update_ttl(&self, check_id: &str, _note: &str) -> Result<(), BackendError> {
        if !self.has_check(check_id) {
            return Err(BackendError::UnknownCheck(check_id.to_string()));
        }
        *self.ttl_passes.entry(check_id.to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn health_service(
        &self,
        service_name: &str,
        wait_index: u64,
        wait: Duration,
        _passing_only: bool,
    ) -> Result<(Vec<ServiceEntry>, u64), BackendError> {
        loop {
            // Register for wakeups before reading the index, otherwise a
            // bump between the read and the wait is lost.
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let index = self.index.load(Ordering::SeqCst);
            if index != wait_index {
                return Ok((self.entries_for(service_name), index));
            }
            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep(wait) => {
                    return Ok((self.entries_for(service_name), index));
                }
            }
        }
    }
}
