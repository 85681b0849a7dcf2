//! Structured logging setup.
//!
//! The gateway logs through `tracing`; this module owns the one place that
//! configures the global subscriber so `main.rs` and test harnesses agree on
//! format and filtering.

mod tracing_init;

pub use tracing_init::init_tracing;
