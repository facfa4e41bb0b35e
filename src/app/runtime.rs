//! Lifecycle orchestrator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Barrier;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::app::options::AppOptions;
use crate::app::signals;
use crate::registry::{RegistryError, ServiceInstance};
use crate::transport::TransportError;

/// Errors terminating [`App::run`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The service instance could not be built before any task started.
    #[error("failed to build service instance: {0}")]
    Build(String),

    #[error("server start failed: {0}")]
    Start(TransportError),

    #[error("server stop failed: {0}")]
    Stop(TransportError),

    #[error("server stop timed out after {0:?}")]
    StopTimeout(Duration),

    #[error("registration failed: {0}")]
    Register(RegistryError),

    #[error("registration timed out after {0:?}")]
    RegisterTimeout(Duration),

    #[error("signal handler install failed: {0}")]
    Signal(std::io::Error),

    #[error("lifecycle task panicked: {0}")]
    Task(tokio::task::JoinError),
}

/// The application: a set of servers, an optional registrar, and a shared
/// cancellation scope driving shutdown.
pub struct App {
    opts: AppOptions,
    scope: CancellationToken,
    /// Set once registration succeeds; read by the status accessors.
    instance: Mutex<Option<ServiceInstance>>,
}

impl App {
    pub fn new(opts: AppOptions) -> Self {
        Self {
            opts,
            scope: CancellationToken::new(),
            instance: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.opts.id
    }

    pub fn name(&self) -> &str {
        &self.opts.name
    }

    pub fn version(&self) -> &str {
        &self.opts.version
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.opts.metadata
    }

    /// Advertised endpoints of the registered instance; empty before
    /// registration succeeds.
    pub fn endpoints(&self) -> Vec<String> {
        self.instance
            .lock()
            .unwrap()
            .as_ref()
            .map(|instance| instance.endpoints.clone())
            .unwrap_or_default()
    }

    /// Trigger shutdown. Idempotent; only cancels the shared scope.
    pub fn stop(&self) {
        self.scope.cancel();
    }

    /// Run all servers and block until shutdown.
    ///
    /// Returns an error only for unrecoverable failures; a signal-triggered
    /// stop returns `Ok(())`.
    pub async fn run(&self) -> Result<(), AppError> {
        let instance = self.build_instance()?;
        tracing::info!(
            id = %instance.id,
            name = %instance.name,
            version = %instance.version,
            servers = self.opts.servers.len(),
            "starting"
        );

        let mut group: JoinSet<Result<(), AppError>> = JoinSet::new();
        let launched = Arc::new(Barrier::new(self.opts.servers.len() + 1));

        for srv in &self.opts.servers {
            // Stopper: wait for the shared scope, then stop under a fresh
            // bounded timeout.
            let stopper = srv.clone();
            let scope = self.scope.clone();
            let stop_timeout = self.opts.stop_timeout;
            group.spawn(async move {
                scope.cancelled().await;
                match timeout(stop_timeout, stopper.stop()).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(err)) => Err(AppError::Stop(err)),
                    Err(_) => Err(AppError::StopTimeout(stop_timeout)),
                }
            });

            // Starter: signal launched, then block in start.
            let starter = srv.clone();
            let scope = self.scope.clone();
            let launched = launched.clone();
            group.spawn(async move {
                launched.wait().await;
                starter.start(scope).await.map_err(AppError::Start)
            });
        }

        // Servers are at least scheduled before registration proceeds. This
        // does not guarantee bound/listening.
        launched.wait().await;

        if let Some(registrar) = &self.opts.registrar {
            match timeout(self.opts.registrar_timeout, registrar.register(&instance)).await {
                Ok(Ok(())) => {
                    tracing::info!(id = %instance.id, name = %instance.name, "service registered");
                    *self.instance.lock().unwrap() = Some(instance.clone());
                }
                Ok(Err(err)) => {
                    self.unwind(&mut group).await;
                    return Err(AppError::Register(err));
                }
                Err(_) => {
                    self.unwind(&mut group).await;
                    return Err(AppError::RegisterTimeout(self.opts.registrar_timeout));
                }
            }
        }

        if !self.opts.signals.is_empty() {
            let scope = self.scope.clone();
            let sigs = self.opts.signals.clone();
            group.spawn(async move {
                tokio::select! {
                    _ = scope.cancelled() => Ok(()),
                    received = signals::wait_for(&sigs) => match received {
                        Ok(sig) => {
                            tracing::info!(signal = ?sig, "termination signal received, stopping");
                            scope.cancel();
                            Ok(())
                        }
                        Err(err) => Err(AppError::Signal(err)),
                    },
                }
            });
        }

        // First real error wins; every error also cancels the scope so the
        // remaining tasks unwind.
        let mut first_err: Option<AppError> = None;
        while let Some(joined) = group.join_next().await {
            let result = joined.unwrap_or_else(|err| Err(AppError::Task(err)));
            if let Err(err) = result {
                tracing::error!(error = %err, "lifecycle task failed");
                if first_err.is_none() {
                    first_err = Some(err);
                }
                self.scope.cancel();
            }
        }

        self.deregister().await;

        match first_err {
            Some(err) => Err(err),
            None => {
                tracing::info!(id = %self.opts.id, "stopped");
                Ok(())
            }
        }
    }

    fn build_instance(&self) -> Result<ServiceInstance, AppError> {
        let mut endpoints: Vec<String> = self
            .opts
            .endpoints
            .iter()
            .map(|endpoint| endpoint.to_string())
            .collect();
        if endpoints.is_empty() {
            for srv in &self.opts.servers {
                let endpoint = srv
                    .endpoint()
                    .map_err(|err| AppError::Build(err.to_string()))?;
                if let Some(endpoint) = endpoint {
                    endpoints.push(endpoint.to_string());
                }
            }
        }
        Ok(ServiceInstance {
            id: self.opts.id.clone(),
            name: self.opts.name.clone(),
            version: self.opts.version.clone(),
            metadata: self.opts.metadata.clone(),
            endpoints,
        })
    }

    /// Cancel the scope and drain the group, discarding results. Used when
    /// registration fails and the already-running servers must come down.
    async fn unwind(&self, group: &mut JoinSet<Result<(), AppError>>) {
        self.scope.cancel();
        while group.join_next().await.is_some() {}
    }

    /// Explicit deregistration step on the way out; failures are logged, not
    /// returned. The backend's TTL grace period is the backstop when the
    /// registry is unreachable during shutdown.
    async fn deregister(&self) {
        if !self.opts.deregister_on_stop {
            return;
        }
        let Some(registrar) = &self.opts.registrar else {
            return;
        };
        let registered = self.instance.lock().unwrap().clone();
        let Some(instance) = registered else {
            return;
        };
        match timeout(self.opts.registrar_timeout, registrar.deregister(&instance)).await {
            Ok(Ok(())) => tracing::info!(id = %instance.id, "service deregistered"),
            Ok(Err(err)) => {
                tracing::warn!(id = %instance.id, error = %err, "deregistration failed")
            }
            Err(_) => tracing::warn!(id = %instance.id, "deregistration timed out"),
        }
    }
}
