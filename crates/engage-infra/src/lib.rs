//! Engage Infrastructure Library
//!
//! Shared infrastructure for processes hosting Engage plugins:
//! - Telemetry initialization (tracing subscriber)

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "observability-basic")]
pub use telemetry::{default_filter, init_telemetry, shutdown_telemetry};
