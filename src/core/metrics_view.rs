//! Metrics View (C2): per-instance telemetry pulled from a PromQL-compatible
//! time-series store, circuit-broken and single-flight cached.

use crate::config::models::MetricsViewConfig;
use crate::core::types::InstanceMetrics;
use crate::utils::error::recovery::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use moka::future::Cache;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct PromQlResponse {
    data: PromQlData,
}

#[derive(Debug, Deserialize)]
struct PromQlData {
    result: Vec<PromQlResult>,
}

#[derive(Debug, Deserialize)]
struct PromQlResult {
    value: (f64, String),
}

/// Metrics view over the external time-series store (C2).
pub struct MetricsView {
    client: reqwest::Client,
    config: MetricsViewConfig,
    breaker: CircuitBreaker,
    /// Single-flight cache keyed by service name (§4.2: "1 s per-service
    /// snapshot cache to coalesce bursts").
    cache: Cache<String, Arc<HashMap<String, InstanceMetrics>>>,
}

impl MetricsView {
    pub fn new(config: MetricsViewConfig) -> Self {
        let client = crate::utils::net::http::get_shared_client().clone();
        let cache = Cache::builder()
            .time_to_live(Duration::from_millis(config.cache_ttl_ms))
            .max_capacity(1024)
            .build();
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: config.cb_failure_threshold,
            success_threshold: 1,
            min_requests: 1,
            timeout: Duration::from_millis(config.cb_open_duration_ms),
            window_size: Duration::from_millis(config.cb_open_duration_ms.max(1) * 2),
        });
        Self {
            client,
            config,
            breaker,
            cache,
        }
    }

    /// True while the breaker is `Open` or `HalfOpen` — the decision path
    /// treats both as "proceed with the zeroed state".
    pub fn is_circuit_open(&self) -> bool {
        self.breaker.state() != CircuitState::Closed
    }

    /// `fetchMetrics(instanceNames) -> map[instance]InstanceMetrics`.
    ///
    /// On an open breaker, returns an empty map immediately. A
    /// service-level cache coalesces concurrent misses.
    pub async fn fetch_metrics(
        &self,
        service_name: &str,
        instance_names: &[String],
    ) -> HashMap<String, InstanceMetrics> {
        if instance_names.is_empty() {
            return HashMap::new();
        }

        if let Some(cached) = self.cache.get(service_name).await {
            return (*cached).clone();
        }

        if self.breaker.state() == CircuitState::Open {
            debug!("metrics view circuit open, short-circuiting with empty map");
            return HashMap::new();
        }

        let result = self
            .breaker
            .call(self.fetch_all(service_name, instance_names))
            .await;

        let metrics = match result {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!("metrics fetch failed: {}", e);
                return HashMap::new();
            }
        };

        self.cache
            .insert(service_name.to_string(), Arc::new(metrics.clone()))
            .await;
        metrics
    }

    /// A fetch across all requested instances only counts as a breaker
    /// failure when *every* instance's queries hard-failed (transport error
    /// or non-2xx from Prometheus itself) — a query that merely resolved no
    /// series is "missing data", not an outage, and is tagged `unavailable`
    /// on the returned `InstanceMetrics` instead.
    async fn fetch_all(
        &self,
        service_name: &str,
        instance_names: &[String],
    ) -> std::result::Result<HashMap<String, InstanceMetrics>, reqwest::Error> {
        let mut out = HashMap::with_capacity(instance_names.len());
        let mut last_err = None;
        let mut any_ok = false;
        for name in instance_names {
            match self.fetch_one(service_name, name).await {
                Ok(metrics) => {
                    any_ok = true;
                    out.insert(name.clone(), metrics);
                }
                Err(e) => {
                    out.insert(name.clone(), InstanceMetrics::default());
                    last_err = Some(e);
                }
            }
        }
        match (any_ok, last_err) {
            (false, Some(e)) => Err(e),
            _ => Ok(out),
        }
    }

    async fn fetch_one(
        &self,
        service_name: &str,
        instance_name: &str,
    ) -> std::result::Result<InstanceMetrics, reqwest::Error> {
        let cpu = self
            .query_labeled("process_cpu_usage", &[], service_name, instance_name)
            .await?;
        let mem_used = self
            .query_labeled("jvm_memory_used_bytes", &[("area", "heap")], service_name, instance_name)
            .await?;
        let mem_max = self
            .query_labeled("jvm_memory_max_bytes", &[("area", "heap")], service_name, instance_name)
            .await?;
        let uptime = self
            .query_labeled("process_uptime_seconds", &[], service_name, instance_name)
            .await?;
        let rate_metric = format!(
            "rate(http_server_requests_seconds_count{{{{labels}}}}[{}])",
            self.config.rate_window
        );
        let rps = self.query_rate(&rate_metric, service_name, instance_name).await?;
        let req_count = self
            .query_labeled("http_server_requests_seconds_count", &[], service_name, instance_name)
            .await?;
        let req_sum = self
            .query_labeled("http_server_requests_seconds_sum", &[], service_name, instance_name)
            .await?;
        let error_count = self
            .query_labeled(
                "http_server_requests_seconds_count",
                &[("status", "4..|5..")],
                service_name,
                instance_name,
            )
            .await?;

        let any_resolved = [cpu, mem_used, mem_max, uptime, rps, req_count, req_sum, error_count]
            .iter()
            .any(|v| v.is_some());

        let mem_pct = match (mem_used, mem_max) {
            (Some(used), Some(max)) if max > 0.0 => used / max * 100.0,
            _ => 0.0,
        };
        let avg_latency_ms = match req_count {
            Some(count) if count > 0.0 => req_sum.unwrap_or(0.0) / count * 1000.0,
            _ => 0.0,
        };
        let error_rate_pct = match req_count {
            Some(count) if count > 0.0 => error_count.unwrap_or(0.0) / count * 100.0,
            _ => 0.0,
        };

        Ok(InstanceMetrics {
            cpu_pct: cpu.unwrap_or(0.0) * 100.0,
            mem_pct,
            avg_latency_ms,
            error_rate_pct,
            reqs_per_sec: rps.unwrap_or(0.0),
            uptime_sec: uptime.unwrap_or(0.0),
            unavailable: !any_resolved,
        })
    }

    /// Try each configured pod label in order (§6: "per-pod labels tried
    /// in order"), returning the first query that resolves a value. Only a
    /// hard transport/HTTP failure on *every* label attempt propagates as
    /// `Err`; a well-formed empty result is `Ok(None)`.
    async fn query_labeled(
        &self,
        metric: &str,
        extra_matchers: &[(&str, &str)],
        service_name: &str,
        instance_name: &str,
    ) -> std::result::Result<Option<f64>, reqwest::Error> {
        let mut last_err = None;
        for label in &self.config.pod_labels {
            let label_value = if label == "service" { service_name } else { instance_name };
            let query = build_promql(metric, extra_matchers, label, label_value);
            match self.query_instant(&query).await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => last_err = None,
                Err(e) => last_err = Some(e),
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Like `query_labeled`, but for a metric whose matcher block sits
    /// inside a `rate(...)` wrapper (`{{labels}}` placeholder).
    async fn query_rate(
        &self,
        template: &str,
        service_name: &str,
        instance_name: &str,
    ) -> std::result::Result<Option<f64>, reqwest::Error> {
        let mut last_err = None;
        for label in &self.config.pod_labels {
            let label_value = if label == "service" { service_name } else { instance_name };
            let labels = format!("{}=\"{}\"", label, label_value);
            let query = template.replace("{{labels}}", &labels);
            match self.query_instant(&query).await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => last_err = None,
                Err(e) => last_err = Some(e),
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    async fn query_instant(&self, promql: &str) -> std::result::Result<Option<f64>, reqwest::Error> {
        let url = format!("{}/api/v1/query", self.config.prometheus_base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("query", promql)])
            .timeout(Duration::from_millis(self.config.query_timeout_ms))
            .send()
            .await?
            .error_for_status()?;
        let parsed: PromQlResponse = response.json().await?;
        Ok(parsed
            .data
            .result
            .first()
            .and_then(|r| r.value.1.parse::<f64>().ok()))
    }
}

/// Build a PromQL instant-query selector: `metric{k1="v1",...,label="value"}`.
/// `extra_matchers` are literal label matchers (e.g. `status=~"4..|5.."` is
/// passed as `("status", "4..|5..")` and rendered with the `=~` regex
/// operator since its value contains regex metacharacters).
fn build_promql(metric: &str, extra_matchers: &[(&str, &str)], label: &str, label_value: &str) -> String {
    let mut parts: Vec<String> = extra_matchers
        .iter()
        .map(|(k, v)| {
            if v.contains(['.', '|', '*']) {
                format!("{k}=~\"{v}\"")
            } else {
                format!("{k}=\"{v}\"")
            }
        })
        .collect();
    parts.push(format!("{label}=\"{label_value}\""));
    format!("{metric}{{{}}}", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MetricsViewConfig {
        MetricsViewConfig {
            prometheus_base_url: "http://localhost:9090".to_string(),
            cache_ttl_ms: 1000,
            cb_failure_threshold: 5,
            cb_open_duration_ms: 30_000,
            query_timeout_ms: 2000,
            pod_labels: vec!["pod_name".to_string()],
            rate_window: "5m".to_string(),
        }
    }

    #[test]
    fn starts_closed() {
        let view = MetricsView::new(test_config());
        assert!(!view.is_circuit_open());
    }

    #[tokio::test]
    async fn empty_instance_list_short_circuits() {
        let view = MetricsView::new(test_config());
        let result = view.fetch_metrics("cart", &[]).await;
        assert!(result.is_empty());
    }
}
