//! Shared mocks for the lifecycle integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use svckit::registry::{Registrar, RegistryError, ServiceInstance};
use svckit::transport::{Server, TransportError};

/// Registrar backed by a plain map, rejecting empty instance ids.
#[derive(Default)]
pub struct MockRegistrar {
    services: Mutex<HashMap<String, ServiceInstance>>,
}

impl MockRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> Vec<String> {
        self.services.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<ServiceInstance> {
        self.services.lock().unwrap().get(id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.services.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl Registrar for MockRegistrar {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        if instance.id.is_empty() {
            return Err(RegistryError::InvalidInstance("no service id".into()));
        }
        self.services
            .lock()
            .unwrap()
            .insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    async fn deregister(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        self.services
            .lock()
            .unwrap()
            .remove(&instance.id)
            .ok_or_else(|| RegistryError::Backend("deregister service not found".into()))?;
        Ok(())
    }
}

/// A server that blocks in `start` until cancelled, recording its lifecycle.
pub struct MockServer {
    started: AtomicBool,
    stopped: AtomicBool,
    fail_start: bool,
    fail_stop: bool,
    hang_stop: bool,
    endpoint: Option<Url>,
}

impl MockServer {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            fail_start: false,
            fail_stop: false,
            hang_stop: false,
            endpoint: None,
        }
    }

    /// A server whose `start` fails immediately.
    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::new()
        }
    }

    /// A server whose `stop` returns an error after recording the attempt.
    pub fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::new()
        }
    }

    /// A server whose `stop` never completes.
    pub fn hanging_stop() -> Self {
        Self {
            hang_stop: true,
            ..Self::new()
        }
    }

    pub fn with_endpoint(url: &str) -> Self {
        Self {
            endpoint: Some(Url::parse(url).unwrap()),
            ..Self::new()
        }
    }

    pub fn was_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Server for MockServer {
    async fn start(&self, shutdown: CancellationToken) -> Result<(), TransportError> {
        self.started.store(true, Ordering::SeqCst);
        if self.fail_start {
            return Err(TransportError::Serve(std::io::Error::other(
                "injected start failure",
            )));
        }
        shutdown.cancelled().await;
        Ok(())
    }

    async fn stop(&self) -> Result<(), TransportError> {
        if self.hang_stop {
            std::future::pending::<()>().await;
        }
        self.stopped.store(true, Ordering::SeqCst);
        if self.fail_stop {
            return Err(TransportError::Serve(std::io::Error::other(
                "injected stop failure",
            )));
        }
        Ok(())
    }

    fn endpoint(&self) -> Result<Option<Url>, TransportError> {
        Ok(self.endpoint.clone())
    }
}
