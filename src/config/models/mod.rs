//! Configuration data models
//!
//! This module defines all configuration structures used throughout the proxy.

#![allow(missing_docs)]

pub mod gateway;
pub mod health_prober;
pub mod metrics;
pub mod monitoring;
pub mod registry;
pub mod rl;
pub mod router;
pub mod server;

// Re-export all configuration types
pub use gateway::*;
pub use health_prober::*;
pub use metrics::*;
pub use monitoring::*;
pub use registry::*;
pub use rl::*;
pub use router::*;
pub use server::*;

/// Default server host
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8080
}

/// Default timeout in seconds
pub fn default_timeout() -> u64 {
    30
}

/// Default maximum body size in bytes
pub fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

pub fn default_metrics_port() -> u16 {
    9090
}

pub fn default_metrics_path() -> String {
    "/metrics".to_string()
}

pub fn default_health_path() -> String {
    "/health".to_string()
}

pub fn default_service_name() -> String {
    "rl-routing-proxy".to_string()
}
