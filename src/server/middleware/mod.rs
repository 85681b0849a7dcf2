//! HTTP middleware implementations
//!
//! - Request ID tracking
//! - Metrics collection
//! - Path classification helpers shared by routing and logging

#![allow(dead_code)]

mod helpers;
mod metrics;
mod request_id;

pub use helpers::{is_actuator_route, is_benchmark_route, is_proxy_route, proxy_service_name};
pub use metrics::{MetricsMiddleware, MetricsMiddlewareService, RequestMetrics};
pub use request_id::{RequestIdMiddleware, RequestIdMiddlewareService};
