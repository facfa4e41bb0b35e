//! Application lifecycle orchestration.
//!
//! # Data Flow
//! ```text
//! App::run()
//!     Build ServiceInstance (explicit endpoints, else ask each server)
//!     → per server: stopper task (wait for cancel, then stop under timeout)
//!                 + starter task (signal launched, then blocking start)
//!     → all starters launched
//!     → register instance (bounded by registrar timeout)
//!     → signal task: SIGTERM/SIGINT/SIGQUIT → App::stop()
//!     → join tasks; deregister on the way out
//!
//! App::stop()
//!     Cancel the shared scope → stoppers run → starters unwind
//! ```
//!
//! # Design Decisions
//! - Fail fast: one server's start failure cancels and unwinds all peers
//! - Registration is a hard startup precondition: no retry, error returned
//! - Stop-phase errors never block other servers' shutdown
//! - Cancellation is the clean-shutdown path, never surfaced as a failure

pub mod options;
pub mod runtime;
pub mod signals;

pub use options::{AppOptions, ShutdownSignal};
pub use runtime::{App, AppError};
