//! Utility modules shared across the routing core, config layer and HTTP
//! server.
//!
//! - **error**: the single `GatewayError` type plus circuit breaker/retry
//!   recovery primitives.
//! - **logging**: `tracing` subscriber setup.
//! - **net**: the shared, connection-pooled `reqwest::Client` used for
//!   upstream forwards, PromQL queries and health probes.

pub mod error;
pub mod logging;
pub mod net;

use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a unique request ID.
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current Unix timestamp, milliseconds.
pub fn current_timestamp_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
