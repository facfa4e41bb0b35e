//! Reference long-poll discovery implementation.
//!
//! # Data Flow
//! ```text
//! Registrar side:
//!     Registry::register
//!         → RegistryClient builds health checks (TCP probes + TTL)
//!         → RegistryBackend::register
//!         → heartbeat task renews the TTL until deregistered
//!
//! Discovery side:
//!     Registry::watch(name)
//!         → get-or-create ServiceSet (one per name)
//!         → first watcher starts the resolver task
//!         → resolver long-polls RegistryBackend::health_service
//!         → index change + non-empty list → ServiceSet::broadcast
//!         → every ServiceWatcher slot armed → next() wakes with snapshot
//! ```
//!
//! # Design Decisions
//! - One resolver task per service name, sequential queries, total ordering
//!   of updates within a name
//! - Snapshot is swapped atomically (arc-swap); readers never contend with
//!   the broadcaster
//! - Watcher slots have capacity 1: undrained updates coalesce into the
//!   most recent snapshot
//! - Backend wire protocol is out of scope; `RegistryBackend` is the seam

pub mod backend;
pub mod client;
pub mod memory;
pub mod registry;
mod service_set;
pub mod watcher;

pub use backend::{BackendError, HealthCheck, RegistryBackend, ServiceEntry, ServiceRegistration};
pub use client::RegistryClient;
pub use memory::MemoryBackend;
pub use registry::{Registry, RegistryOptions};
pub use watcher::ServiceWatcher;
