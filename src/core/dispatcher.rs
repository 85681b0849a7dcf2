//! Proxy Dispatcher (C8): forwards one proxied request to a chosen instance,
//! times it, and emits an async feedback job.
//!
//! Connection counting (for the least-connections baseline) and the
//! feedback queue are owned here since both are dispatch-path concerns; the
//! switchboard (C9) only reads connection counts through
//! `ConnectionCounters`.

use crate::core::types::{Action, Instance};
use crate::utils::error::GatewayError;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::warn;

/// Request/response headers the proxy must not blindly forward (connection
/// management is end-to-end, not hop-by-hop, across this proxy).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

pub fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if !HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Per-instance in-flight request counts, read by the switchboard's
/// least-connections algorithm and maintained here across the life of a
/// forward.
#[derive(Default)]
pub struct ConnectionCounters {
    counts: DashMap<Action, AtomicI64>,
}

impl ConnectionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, instance_name: &str) {
        self.counts
            .entry(instance_name.to_string())
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self, instance_name: &str) {
        if let Some(counter) = self.counts.get(instance_name) {
            counter.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn get(&self, instance_name: &str) -> i64 {
        self.counts
            .get(instance_name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }
}

/// One completed request's outcome, queued for the Decision Service's
/// in-process `/feedback` step (not a real HTTP round trip, §4.9).
#[derive(Debug, Clone)]
pub struct FeedbackJob {
    pub service_name: String,
    pub selected_pod: Action,
    pub response_time_ms: f64,
    pub status_code: u16,
    pub error_occurred: bool,
}

/// Bounded ring buffer: on overflow the oldest entry is dropped rather than
/// the newest, since the newest observation is the
/// more useful one to keep for a policy that's trying to track current
/// conditions.
pub struct FeedbackQueue {
    inner: Mutex<VecDeque<FeedbackJob>>,
    capacity: usize,
    notify: Notify,
    dropped_total: AtomicU64,
}

impl FeedbackQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            capacity,
            notify: Notify::new(),
            dropped_total: AtomicU64::new(0),
        }
    }

    pub fn push(&self, job: FeedbackJob) {
        {
            let mut queue = self.inner.lock();
            if queue.len() >= self.capacity {
                queue.pop_front();
                self.dropped_total.fetch_add(1, Ordering::Relaxed);
                warn!("feedback queue at capacity, dropping oldest entry");
            }
            queue.push_back(job);
        }
        self.notify.notify_one();
    }

    pub async fn pop(&self) -> FeedbackJob {
        loop {
            if let Some(job) = self.inner.lock().pop_front() {
                return job;
            }
            self.notify.notified().await;
        }
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped_total.load(Ordering::Relaxed)
    }
}

pub struct ForwardedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub elapsed: Duration,
}

pub struct Dispatcher {
    client: reqwest::Client,
    upstream_timeout: Duration,
    pub connections: Arc<ConnectionCounters>,
    pub feedback: Arc<FeedbackQueue>,
}

impl Dispatcher {
    pub fn new(upstream_timeout_ms: u64, feedback_queue_capacity: usize) -> Self {
        Self {
            client: crate::utils::net::http::get_shared_client().clone(),
            upstream_timeout: Duration::from_millis(upstream_timeout_ms),
            connections: Arc::new(ConnectionCounters::new()),
            feedback: Arc::new(FeedbackQueue::new(feedback_queue_capacity)),
        }
    }

    /// Forwards one request to `instance`, preserving method, headers (minus
    /// hop-by-hop) and body. `downstream_path` is the path (plus query)
    /// appended to the instance's base URL.
    pub async fn forward(
        &self,
        instance: &Instance,
        method: reqwest::Method,
        downstream_path: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<ForwardedResponse, GatewayError> {
        self.connections.inc(&instance.instance_name);
        let started = Instant::now();
        let result = self
            .forward_inner(instance, method, downstream_path, headers, body)
            .await;
        self.connections.dec(&instance.instance_name);

        result.map(|(status, headers, body)| ForwardedResponse {
            status,
            headers,
            body,
            elapsed: started.elapsed(),
        })
    }

    async fn forward_inner(
        &self,
        instance: &Instance,
        method: reqwest::Method,
        downstream_path: &str,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<(u16, HeaderMap, Bytes), GatewayError> {
        let url = format!(
            "{}{}",
            instance.url.trim_end_matches('/'),
            downstream_path
        );

        let request = self
            .client
            .request(method, &url)
            .headers(strip_hop_by_hop(&headers))
            .body(body)
            .timeout(self.upstream_timeout);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::upstream_timeout(format!("{} timed out: {}", url, e))
            } else {
                GatewayError::upstream_error(format!("{} unreachable: {}", url, e))
            }
        })?;

        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::upstream_error(format!("{} body read failed: {}", url, e)))?;

        Ok((status, response_headers, body))
    }

    /// Queues the outcome for async Q-table feedback; never blocks the
    /// response path.
    pub fn emit_feedback(&self, job: FeedbackJob) {
        self.feedback.push(job);
    }
}

pub fn header_name(name: &str) -> Option<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).ok()
}

pub fn header_value(value: &[u8]) -> Option<HeaderValue> {
    HeaderValue::from_bytes(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        let stripped = strip_hop_by_hop(&headers);
        assert!(!stripped.contains_key("connection"));
        assert!(stripped.contains_key("content-type"));
    }

    #[test]
    fn connection_counters_track_in_flight_requests() {
        let counters = ConnectionCounters::new();
        counters.inc("p1");
        counters.inc("p1");
        counters.dec("p1");
        assert_eq!(counters.get("p1"), 1);
        assert_eq!(counters.get("never-touched"), 0);
    }

    #[tokio::test]
    async fn feedback_queue_drops_oldest_on_overflow() {
        let queue = FeedbackQueue::new(2);
        let job = |pod: &str| FeedbackJob {
            service_name: "svc".to_string(),
            selected_pod: pod.to_string(),
            response_time_ms: 10.0,
            status_code: 200,
            error_occurred: false,
        };
        queue.push(job("p1"));
        queue.push(job("p2"));
        queue.push(job("p3"));

        assert_eq!(queue.dropped_total(), 1);
        let first = queue.pop().await;
        assert_eq!(first.selected_pod, "p2");
        let second = queue.pop().await;
        assert_eq!(second.selected_pod, "p3");
    }
}
