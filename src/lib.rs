//! svckit: microservice bootstrap runtime.
//!
//! Manages the startup/shutdown lifecycle of one or more network-facing
//! servers and maintains their presence in an external service registry so
//! other services can discover them.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────┐
//!                 │                    App                        │
//!                 │  build instance → start servers → register    │
//!                 │  signal/stop → cancel scope → stop servers    │
//!                 │          → deregister on the way out          │
//!                 └──────┬──────────────────────────┬─────────────┘
//!                        │                          │
//!                 Server trait               Registrar trait
//!                 (transport)                  (registry)
//!                        │                          │
//!                 ┌──────┴──────┐          ┌────────┴────────┐
//!                 │  HttpServer │          │    Registry     │
//!                 │   (axum)    │          │  (discovery)    │
//!                 └─────────────┘          └────────┬────────┘
//!                                                   │
//!                                  per-name resolver task (long-poll)
//!                                                   │
//!                              ServiceSet snapshot + watcher fan-out
//!                                                   │
//!                                   Watcher::next() in consumers
//! ```

// Core subsystems
pub mod app;
pub mod discovery;
pub mod registry;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use app::{App, AppError, AppOptions};
pub use config::AppConfig;
pub use registry::{Discovery, Registrar, RegistryError, ServiceInstance, Watcher};
pub use transport::{HttpServer, Server};
