//! Health Prober (C10): an active probe loop independent of whatever the
//! registry producer itself reports.
//!
//! Every `probe_ms` it issues a GET to each known instance's `health_url`;
//! 2xx marks the instance healthy, anything else (including a timeout)
//! marks it unhealthy. The result is consulted *in addition to* the
//! registry's own `healthy` flag at the point of use (decision and dispatch
//! both AND the two signals together) rather than mutated into the registry
//! view's snapshot — see `DESIGN.md` for why.
//!
//! Shaped like `HealthMonitor::start_health_check_task` elsewhere in this
//! crate: one spawned interval loop, a `DashMap` of current status, graceful
//! abort on shutdown.

use crate::config::models::HealthProbeConfig;
use crate::core::registry::RegistryView;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct HealthProber {
    config: HealthProbeConfig,
    client: reqwest::Client,
    status: DashMap<String, bool>,
}

impl HealthProber {
    pub fn new(config: HealthProbeConfig) -> Self {
        Self {
            config,
            client: crate::utils::net::http::get_shared_client().clone(),
            status: DashMap::new(),
        }
    }

    /// `true` until the first probe completes for an instance, so a
    /// freshly-registered instance isn't excluded before it's ever been
    /// checked; the registry's own `healthy` flag is authoritative until
    /// then.
    pub fn is_healthy(&self, instance_name: &str) -> bool {
        self.status.get(instance_name).map(|v| *v).unwrap_or(true)
    }

    pub async fn probe_once(&self, registry: &RegistryView) {
        let mut seen = std::collections::HashSet::new();
        for service_name in registry.all_services() {
            for instance in registry.instances(&service_name) {
                seen.insert(instance.instance_name.clone());
                let healthy = self.probe_instance(&instance.health_url).await;
                self.status.insert(instance.instance_name.clone(), healthy);
            }
        }
        self.status.retain(|name, _| seen.contains(name));
    }

    async fn probe_instance(&self, health_url: &str) -> bool {
        let result = self
            .client
            .get(health_url)
            .timeout(Duration::from_millis(self.config.probe_timeout_ms))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("health probe to {} returned {}", health_url, response.status());
                false
            }
            Err(e) => {
                warn!("health probe to {} failed: {}", health_url, e);
                false
            }
        }
    }

    pub fn spawn(self: Arc<Self>, registry: Arc<RegistryView>) -> tokio::task::JoinHandle<()> {
        let probe_ms = self.config.probe_ms;
        tokio::spawn(async move {
            info!("health prober starting, interval {}ms", probe_ms);
            let mut interval = tokio::time::interval(Duration::from_millis(probe_ms));
            loop {
                interval.tick().await;
                self.probe_once(&registry).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprobed_instance_defaults_to_healthy() {
        let prober = HealthProber::new(HealthProbeConfig::default());
        assert!(prober.is_healthy("never-probed"));
    }

    #[tokio::test]
    async fn probe_marks_unreachable_instance_unhealthy() {
        let prober = HealthProber::new(HealthProbeConfig {
            probe_ms: 5_000,
            probe_timeout_ms: 100,
        });
        let healthy = prober.probe_instance("http://127.0.0.1:1/health").await;
        assert!(!healthy);
    }
}
