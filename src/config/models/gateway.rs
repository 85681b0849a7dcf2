//! Top-level gateway configuration aggregating every component config.

#![allow(missing_docs)]

use super::*;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the routing proxy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Registry view (C1).
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Metrics view (C2).
    #[serde(default)]
    pub metrics_view: MetricsViewConfig,
    /// Routing policy engine (C3-C6).
    #[serde(default)]
    pub rl: RlConfig,
    /// Algorithm switchboard + proxy dispatcher (C8, C9).
    #[serde(default)]
    pub router: RouterConfig,
    /// Health prober (C10).
    #[serde(default)]
    pub health_prober: HealthProbeConfig,
    /// Observability: metrics/tracing/own health endpoint.
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

#[allow(dead_code)]
impl GatewayConfig {
    pub fn from_env() -> crate::utils::error::Result<Self> {
        Ok(Self::default())
    }

    /// Merge two configurations, with `other` taking precedence.
    pub fn merge(mut self, other: Self) -> Self {
        self.server = self.server.merge(other.server);
        self.registry = self.registry.merge(other.registry);
        self.metrics_view = self.metrics_view.merge(other.metrics_view);
        self.rl = self.rl.merge(other.rl);
        self.router = self.router.merge(other.router);
        self.health_prober = self.health_prober.merge(other.health_prober);
        self.monitoring = self.monitoring.merge(other.monitoring);
        self
    }

    /// Validate the configuration (cheap structural checks; the richer
    /// `Validate` trait impls in `config::validation` run on top of this).
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }
        if self.registry.redis_url.is_empty() {
            return Err("Registry redis_url is required".to_string());
        }
        if self.metrics_view.prometheus_base_url.is_empty() {
            return Err("Metrics view prometheus_base_url is required".to_string());
        }
        if !(0.0..=1.0).contains(&self.rl.learning_rate) {
            return Err("rl.learning_rate must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.rl.discount_factor) {
            return Err("rl.discount_factor must be within [0, 1]".to_string());
        }
        Ok(())
    }
}
