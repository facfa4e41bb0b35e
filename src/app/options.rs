//! Application options.
//!
//! # Design Decisions
//! - Explicit configuration record with a builder; defaults are applied at
//!   construction, overrides on top
//! - Explicit endpoints take precedence over server-derived ones

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use url::Url;
use uuid::Uuid;

use crate::registry::Registrar;
use crate::transport::Server;

const DEFAULT_REGISTRAR_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// OS termination signals the orchestrator intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Terminate,
    Interrupt,
    Quit,
}

/// Configuration record for [`super::App`].
pub struct AppOptions {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) version: String,
    pub(crate) metadata: HashMap<String, String>,
    pub(crate) endpoints: Vec<Url>,
    pub(crate) signals: Vec<ShutdownSignal>,
    pub(crate) registrar_timeout: Duration,
    pub(crate) stop_timeout: Duration,
    pub(crate) registrar: Option<Arc<dyn Registrar>>,
    pub(crate) deregister_on_stop: bool,
    pub(crate) servers: Vec<Arc<dyn Server>>,
}

impl AppOptions {
    /// Defaults: generated instance id, TERM/INT/QUIT signal set, 10s
    /// registrar and stop timeouts, deregistration on stop.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            version: String::new(),
            metadata: HashMap::new(),
            endpoints: Vec::new(),
            signals: vec![
                ShutdownSignal::Terminate,
                ShutdownSignal::Interrupt,
                ShutdownSignal::Quit,
            ],
            registrar_timeout: DEFAULT_REGISTRAR_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            registrar: None,
            deregister_on_stop: true,
            servers: Vec::new(),
        }
    }

    /// Build options from a validated [`AppConfig`]. Servers and the
    /// registrar are attached afterwards by the caller.
    pub fn from_config(config: &crate::config::AppConfig) -> Result<Self, url::ParseError> {
        let mut opts = Self::new();
        if let Some(id) = &config.service.id {
            opts.id = id.clone();
        }
        opts.name = config.service.name.clone();
        opts.version = config.service.version.clone();
        opts.metadata = config.service.metadata.clone();
        opts.endpoints = config
            .service
            .endpoints
            .iter()
            .map(|endpoint| Url::parse(endpoint))
            .collect::<Result<_, _>>()?;
        opts.registrar_timeout = Duration::from_secs(config.timeouts.registrar_secs);
        opts.stop_timeout = Duration::from_secs(config.timeouts.stop_secs);
        Ok(opts)
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Explicit advertised endpoints; overrides server-derived endpoints.
    pub fn endpoints(mut self, endpoints: Vec<Url>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn signals(mut self, signals: Vec<ShutdownSignal>) -> Self {
        self.signals = signals;
        self
    }

    pub fn registrar_timeout(mut self, timeout: Duration) -> Self {
        self.registrar_timeout = timeout;
        self
    }

    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn registrar(mut self, registrar: Arc<dyn Registrar>) -> Self {
        self.registrar = Some(registrar);
        self
    }

    /// Whether `run` deregisters the instance after the task group completes.
    pub fn deregister_on_stop(mut self, deregister: bool) -> Self {
        self.deregister_on_stop = deregister;
        self
    }

    pub fn server(mut self, server: Arc<dyn Server>) -> Self {
        self.servers.push(server);
        self
    }

    pub fn servers(mut self, servers: Vec<Arc<dyn Server>>) -> Self {
        self.servers = servers;
        self
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = AppOptions::new();
        assert!(!opts.id.is_empty());
        assert_eq!(opts.registrar_timeout, Duration::from_secs(10));
        assert_eq!(opts.stop_timeout, Duration::from_secs(10));
        assert_eq!(opts.signals.len(), 3);
        assert!(opts.deregister_on_stop);
        assert!(opts.registrar.is_none());
        assert!(opts.servers.is_empty());
    }

    #[test]
    fn test_overrides_apply_after_defaults() {
        let opts = AppOptions::new()
            .id("inst-9")
            .name("orders")
            .version("1.0.0")
            .stop_timeout(Duration::from_secs(3))
            .signals(vec![ShutdownSignal::Terminate]);
        assert_eq!(opts.id, "inst-9");
        assert_eq!(opts.name, "orders");
        assert_eq!(opts.version, "1.0.0");
        assert_eq!(opts.stop_timeout, Duration::from_secs(3));
        assert_eq!(opts.signals, vec![ShutdownSignal::Terminate]);
        // Untouched fields keep their defaults.
        assert_eq!(opts.registrar_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(AppOptions::new().id, AppOptions::new().id);
    }

    #[test]
    fn test_from_config_maps_fields() {
        let mut config = crate::config::AppConfig::default();
        config.service.id = Some("inst-1".into());
        config.service.name = "orders".into();
        config.service.endpoints = vec!["http://127.0.0.1:9000".into()];
        config.timeouts.stop_secs = 5;

        let opts = AppOptions::from_config(&config).unwrap();
        assert_eq!(opts.id, "inst-1");
        assert_eq!(opts.name, "orders");
        assert_eq!(opts.endpoints.len(), 1);
        assert_eq!(opts.stop_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_config_generates_id_when_absent() {
        let config = crate::config::AppConfig::default();
        let opts = AppOptions::from_config(&config).unwrap();
        assert!(!opts.id.is_empty());
    }
}
