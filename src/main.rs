//! svckit demo binary.
//!
//! Wires the full lifecycle against the in-memory registry backend: load
//! config, bind an HTTP server, register with the registry, and run until a
//! termination signal arrives. Self-contained so it needs no external
//! registry to try out.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use svckit::app::{App, AppOptions};
use svckit::config::{load_config, AppConfig};
use svckit::discovery::{MemoryBackend, Registry, RegistryOptions};
use svckit::observability;
use svckit::transport::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => AppConfig::default(),
    };
    tracing::info!(
        name = %config.service.name,
        version = %config.service.version,
        bind_address = %config.http.bind_address,
        "configuration loaded"
    );

    let server = Arc::new(HttpServer::bind(&config.http.bind_address).await?);
    let registry = Arc::new(Registry::with_options(
        Arc::new(MemoryBackend::new()),
        RegistryOptions {
            heartbeat: config.discovery.heartbeat,
            enable_health_check: config.discovery.health_check,
            health_check_interval: Duration::from_secs(config.discovery.health_check_interval_secs),
        },
    ));

    let opts = AppOptions::from_config(&config)?
        .server(server)
        .registrar(registry);
    let app = App::new(opts);

    app.run().await?;
    tracing::info!("shutdown complete");
    Ok(())
}
