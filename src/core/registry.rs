//! Registry View (C1): an eventually-consistent snapshot of `{service -> [instance]}`
//! pulled from the external Redis-backed key-value store.
//!
//! Readers never block on the store — they read an `ArcSwap`
//! snapshot that the poller replaces atomically after each successful poll,
//! the same copy-on-replace discipline used elsewhere in this crate for
//! provider-style maps.

use crate::config::models::RegistryConfig;
use crate::core::types::{Instance, ServiceView};
use crate::storage::RedisRegistryStore;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Wire shape of one `service:<id>` value, per §6's external interface
/// contract. Field names follow the producer's JSON, not this crate's
/// snake_case convention.
#[derive(Debug, Deserialize)]
struct RegistryRecord {
    #[serde(rename = "serviceName")]
    service_name: String,
    #[serde(rename = "instanceName")]
    instance_name: String,
    url: String,
    #[serde(rename = "healthUrl")]
    health_url: String,
    #[serde(default)]
    healthy: bool,
    #[serde(rename = "lastHealthCheck", default)]
    last_health_check: Option<DateTime<Utc>>,
    #[serde(rename = "responseTime", default)]
    response_time: Option<f64>,
}

impl From<RegistryRecord> for Instance {
    fn from(r: RegistryRecord) -> Self {
        Instance {
            service_name: r.service_name,
            instance_name: r.instance_name,
            url: r.url,
            health_url: r.health_url,
            healthy: r.healthy,
            last_health_check: r.last_health_check,
            response_time_ms: r.response_time,
        }
    }
}

/// Eventually-consistent view over the registry backing store (C1).
pub struct RegistryView {
    store: RedisRegistryStore,
    config: RegistryConfig,
    snapshot: ArcSwap<HashMap<String, ServiceView>>,
    last_poll_success_ms: AtomicU64,
    poll_failures_total: AtomicU64,
    has_ever_succeeded: std::sync::atomic::AtomicBool,
}

impl RegistryView {
    pub fn new(store: RedisRegistryStore, config: RegistryConfig) -> Self {
        Self {
            store,
            config,
            snapshot: ArcSwap::from_pointee(HashMap::new()),
            last_poll_success_ms: AtomicU64::new(0),
            poll_failures_total: AtomicU64::new(0),
            has_ever_succeeded: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// `instances(serviceName) -> []Instance` — never blocks on the store.
    pub fn instances(&self, service_name: &str) -> Vec<Instance> {
        self.snapshot
            .load()
            .get(service_name)
            .map(|view| view.instances.clone())
            .unwrap_or_default()
    }

    /// `allServices() -> [serviceName]`.
    pub fn all_services(&self) -> Vec<String> {
        self.snapshot.load().keys().cloned().collect()
    }

    /// True once at least one poll has succeeded (`/health`'s `rlAgentReady`
    /// precondition, §4.7).
    pub fn has_snapshot(&self) -> bool {
        self.has_ever_succeeded.load(Ordering::Relaxed)
    }

    pub fn poll_failures(&self) -> u64 {
        self.poll_failures_total.load(Ordering::Relaxed)
    }

    /// A snapshot older than `poll_ms * staleness_multiplier` is `REGISTRY_STALE`
    /// (§7).
    pub fn is_stale(&self) -> bool {
        if !self.has_snapshot() {
            return true;
        }
        let last = self.last_poll_success_ms.load(Ordering::Relaxed);
        let now = now_ms();
        let staleness_window = self.config.poll_ms * self.config.staleness_multiplier as u64;
        now.saturating_sub(last) > staleness_window
    }

    /// One poll cycle: `KEYS <prefix>*` then `MGET`, parse, atomic swap.
    /// Store errors are logged and the previous snapshot retained (§4.1
    /// "Failure semantics").
    pub async fn refresh(&self) {
        match self.refresh_inner().await {
            Ok(count) => {
                self.last_poll_success_ms.store(now_ms(), Ordering::Relaxed);
                self.has_ever_succeeded.store(true, Ordering::Relaxed);
                debug!("registry poll refreshed {} service(s)", count);
            }
            Err(e) => {
                self.poll_failures_total.fetch_add(1, Ordering::Relaxed);
                warn!("registry poll failed, retaining previous snapshot: {}", e);
            }
        }
    }

    async fn refresh_inner(&self) -> crate::utils::error::Result<usize> {
        let keys = self.store.scan_keys().await?;
        let values = self.store.mget(&keys).await?;

        let mut by_service: HashMap<String, Vec<Instance>> = HashMap::new();
        for raw in values.into_iter().flatten() {
            match serde_json::from_str::<RegistryRecord>(&raw) {
                Ok(record) => {
                    let instance: Instance = record.into();
                    by_service
                        .entry(instance.service_name.clone())
                        .or_default()
                        .push(instance);
                }
                Err(e) => {
                    warn!("skipping malformed registry record: {}", e);
                }
            }
        }

        let views: HashMap<String, ServiceView> = by_service
            .into_iter()
            .map(|(name, instances)| (name, ServiceView { instances }))
            .collect();
        let count = views.len();
        self.snapshot.store(Arc::new(views));
        Ok(count)
    }

    /// Spawn the background poller, returning its `JoinHandle` for graceful
    /// shutdown tracking.
    pub fn spawn_poller(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let poll_ms = self.config.poll_ms;
        tokio::spawn(async move {
            info!("registry poller starting, interval {}ms", poll_ms);
            let mut interval = tokio::time::interval(Duration::from_millis(poll_ms));
            loop {
                interval.tick().await;
                self.refresh().await;
            }
        })
    }
}

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registry_record_camel_case() {
        let raw = r#"{"serviceName":"cart","instanceName":"p1","url":"http://p1","healthUrl":"http://p1/health","healthy":true,"lastHealthCheck":"2026-01-01T00:00:00Z","responseTime":42.0}"#;
        let record: RegistryRecord = serde_json::from_str(raw).unwrap();
        let instance: Instance = record.into();
        assert_eq!(instance.service_name, "cart");
        assert_eq!(instance.instance_name, "p1");
        assert!(instance.healthy);
        assert_eq!(instance.response_time_ms, Some(42.0));
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let raw = r#"{"serviceName":"cart","instanceName":"p1","url":"http://p1","healthUrl":"http://p1/health"}"#;
        let record: RegistryRecord = serde_json::from_str(raw).unwrap();
        let instance: Instance = record.into();
        assert!(!instance.healthy);
        assert!(instance.last_health_check.is_none());
    }
}
