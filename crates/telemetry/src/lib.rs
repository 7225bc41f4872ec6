//! Telemetry for the analytics collector.
//!
//! Structured logging, a global health registry and in-process counters.
//! Nothing is exported to an external system; the scheduler logs snapshots.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
