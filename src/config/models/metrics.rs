//! Metrics view (C2) configuration: the PromQL endpoint, its circuit
//! breaker and its single-flight cache.

use serde::{Deserialize, Serialize};

fn default_prometheus_base_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_cache_ttl_ms() -> u64 {
    1_000
}

fn default_cb_failure_threshold() -> u32 {
    5
}

fn default_cb_open_duration_ms() -> u64 {
    30_000
}

fn default_query_timeout_ms() -> u64 {
    2_000
}

fn default_pod_labels() -> Vec<String> {
    vec![
        "pod_name".to_string(),
        "application".to_string(),
        "job".to_string(),
        "service".to_string(),
    ]
}

fn default_rate_window() -> String {
    "5m".to_string()
}

/// Metrics view configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsViewConfig {
    /// Base URL of the PromQL-compatible HTTP API (`${base}/api/v1/query`).
    #[serde(default = "default_prometheus_base_url")]
    pub prometheus_base_url: String,
    /// Per-service cache TTL used to coalesce bursts (single-flight).
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,
    /// Consecutive failures before the circuit opens.
    #[serde(default = "default_cb_failure_threshold")]
    pub cb_failure_threshold: u32,
    /// How long the circuit stays open before probing half-open.
    #[serde(default = "default_cb_open_duration_ms")]
    pub cb_open_duration_ms: u64,
    /// Per-query HTTP timeout against the PromQL endpoint.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Per-pod labels tried in order when templating PromQL queries.
    #[serde(default = "default_pod_labels")]
    pub pod_labels: Vec<String>,
    /// Window used by the `rate(...)` request-rate query.
    #[serde(default = "default_rate_window")]
    pub rate_window: String,
}

impl Default for MetricsViewConfig {
    fn default() -> Self {
        Self {
            prometheus_base_url: default_prometheus_base_url(),
            cache_ttl_ms: default_cache_ttl_ms(),
            cb_failure_threshold: default_cb_failure_threshold(),
            cb_open_duration_ms: default_cb_open_duration_ms(),
            query_timeout_ms: default_query_timeout_ms(),
            pod_labels: default_pod_labels(),
            rate_window: default_rate_window(),
        }
    }
}

impl MetricsViewConfig {
    pub fn merge(mut self, other: Self) -> Self {
        if other.prometheus_base_url != default_prometheus_base_url() {
            self.prometheus_base_url = other.prometheus_base_url;
        }
        if other.cache_ttl_ms != default_cache_ttl_ms() {
            self.cache_ttl_ms = other.cache_ttl_ms;
        }
        if other.cb_failure_threshold != default_cb_failure_threshold() {
            self.cb_failure_threshold = other.cb_failure_threshold;
        }
        if other.cb_open_duration_ms != default_cb_open_duration_ms() {
            self.cb_open_duration_ms = other.cb_open_duration_ms;
        }
        if other.query_timeout_ms != default_query_timeout_ms() {
            self.query_timeout_ms = other.query_timeout_ms;
        }
        if other.pod_labels != default_pod_labels() {
            self.pod_labels = other.pod_labels;
        }
        if other.rate_window != default_rate_window() {
            self.rate_window = other.rate_window;
        }
        self
    }
}
