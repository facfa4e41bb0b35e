//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging through the `tracing` facade; subsystems emit
//!   events with fields, never format strings by hand
//! - The subscriber is installed once at process start and treated as
//!   read-only thereafter

pub mod logging;
