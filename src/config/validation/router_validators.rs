//! Validators for the registry view, metrics view, routing policy engine,
//! switchboard and health prober configurations.

use super::ssrf::validate_url_against_ssrf;
use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for RegistryConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating registry configuration");

        if self.redis_url.is_empty() {
            return Err("registry.redis_url cannot be empty".to_string());
        }
        if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
            return Err("registry.redis_url must use redis:// or rediss://".to_string());
        }
        if self.key_prefix.is_empty() {
            return Err("registry.key_prefix cannot be empty".to_string());
        }
        if self.poll_ms == 0 {
            return Err("registry.poll_ms must be greater than 0".to_string());
        }
        if self.staleness_multiplier == 0 {
            return Err("registry.staleness_multiplier must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for MetricsViewConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating metrics view configuration");

        validate_url_against_ssrf(&self.prometheus_base_url, "metrics_view.prometheus_base_url")?;

        if self.cb_failure_threshold == 0 {
            return Err("metrics_view.cb_failure_threshold must be greater than 0".to_string());
        }
        if self.cb_open_duration_ms == 0 {
            return Err("metrics_view.cb_open_duration_ms must be greater than 0".to_string());
        }
        if self.pod_labels.is_empty() {
            return Err("metrics_view.pod_labels cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Validate for RlConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating routing policy engine configuration");

        if !(0.0..=1.0).contains(&self.learning_rate) {
            return Err("rl.learning_rate must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err("rl.discount_factor must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) {
            return Err("rl.epsilon_start must be within [0, 1]".to_string());
        }
        if self.epsilon_min > self.epsilon_start {
            return Err("rl.epsilon_min cannot exceed rl.epsilon_start".to_string());
        }
        if !(0.0..=1.0).contains(&self.epsilon_decay) {
            return Err("rl.epsilon_decay must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("rl.confidence_threshold must be within [0, 1]".to_string());
        }
        if self.anti_concentration_run == 0 {
            return Err("rl.anti_concentration_run must be greater than 0".to_string());
        }

        let w = &self.reward_weights;
        if [w.latency, w.error, w.throughput, w.balance, w.stability]
            .iter()
            .any(|v| *v < 0.0)
        {
            return Err("rl.reward_weights must all be non-negative".to_string());
        }

        for (name, bin) in [
            ("cpu", self.bin_widths.cpu),
            ("mem", self.bin_widths.mem),
            ("latency_ms", self.bin_widths.latency_ms),
            ("error_rate", self.bin_widths.error_rate),
            ("reqs_per_sec", self.bin_widths.reqs_per_sec),
        ] {
            if bin.width <= 0.0 {
                return Err(format!("rl.bin_widths.{name}.width must be > 0"));
            }
        }

        Ok(())
    }
}

impl Validate for RouterConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating switchboard/dispatcher configuration");

        self.default_algorithm
            .parse::<crate::core::types::Algorithm>()
            .map_err(|e| format!("router.default_algorithm invalid: {e}"))?;

        if self.decision_timeout_ms == 0 {
            return Err("router.decision_timeout_ms must be greater than 0".to_string());
        }
        if self.upstream_timeout_ms == 0 {
            return Err("router.upstream_timeout_ms must be greater than 0".to_string());
        }
        if self.feedback_queue_capacity == 0 {
            return Err("router.feedback_queue_capacity must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for HealthProbeConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating health prober configuration");

        if self.probe_ms == 0 {
            return Err("health_prober.probe_ms must be greater than 0".to_string());
        }
        if self.probe_timeout_ms == 0 {
            return Err("health_prober.probe_timeout_ms must be greater than 0".to_string());
        }
        if self.probe_timeout_ms >= self.probe_ms {
            return Err(
                "health_prober.probe_timeout_ms should be smaller than probe_ms".to_string(),
            );
        }
        Ok(())
    }
}
