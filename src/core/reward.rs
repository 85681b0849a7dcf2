//! Reward Calculator (C4): turns one feedback observation into a scalar
//! reward the Q-table update consumes.
//!
//! Two modes, selected by the caller at feedback time:
//! - full: five tanh-normalized components, weighted by the configured
//!   (re-normalized) weights.
//! - simplified: a status-only fallback used while the metrics view is
//!   circuit-broken, since the full formula needs post-request telemetry
//!   that isn't available then.

use crate::config::models::RewardWeightsConfig;

/// Everything the full reward formula needs beyond the response status.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewardContext {
    pub response_time_ms: f64,
    pub post_reqs_per_sec: f64,
    /// CPU% of every healthy instance in the service, used for the balance
    /// term's variance. Includes the selected instance.
    pub healthy_cpu_pcts: [f64; 8],
    pub healthy_cpu_count: usize,
    pub post_latency_ms: f64,
    /// The instance's historical mean latency, if one exists yet (first
    /// observation for a pod has none, so the stability term defaults to 0).
    pub historical_mean_latency_ms: Option<f64>,
}

impl RewardContext {
    pub fn healthy_cpu_pcts(&self) -> &[f64] {
        &self.healthy_cpu_pcts[..self.healthy_cpu_count.min(self.healthy_cpu_pcts.len())]
    }
}

/// Computes both reward modes against a fixed, re-normalized weight set.
pub struct RewardCalculator {
    weights: RewardWeightsConfig,
    stability_tolerance: f64,
}

impl RewardCalculator {
    pub fn new(weights: RewardWeightsConfig, stability_tolerance: f64) -> Self {
        Self {
            weights: weights.normalized(),
            stability_tolerance,
        }
    }

    /// Full five-component reward. Range is approximately
    /// `[-2.0, 1.0]` since every term but balance is tanh-bounded to
    /// `[-1, 1]` and balance is non-positive.
    pub fn compute_full(&self, status_code: u16, ctx: &RewardContext) -> f64 {
        let latency_term = (-ctx.response_time_ms / 1000.0).tanh();
        let error_term = (-error_indicator(status_code)).tanh();
        let throughput_term = (ctx.post_reqs_per_sec / 100.0).tanh();
        let balance_term = -(variance(ctx.healthy_cpu_pcts()) / 100.0).clamp(0.0, 1.0);
        let stability_term = self.stability_term(ctx);

        self.weights.latency * latency_term
            + self.weights.error * error_term
            + self.weights.throughput * throughput_term
            + self.weights.balance * balance_term
            + self.weights.stability * stability_term
    }

    fn stability_term(&self, ctx: &RewardContext) -> f64 {
        match ctx.historical_mean_latency_ms {
            Some(mean) if mean > 0.0 => {
                let drift = (ctx.post_latency_ms - mean).abs() / mean;
                if drift <= self.stability_tolerance {
                    1.0
                } else {
                    0.0
                }
            }
            // No history yet for this pod: neither rewarded nor penalized.
            _ => 0.0,
        }
    }

    /// Status-only fallback used when the metrics view's circuit is open and
    /// post-request telemetry can't be trusted.
    pub fn compute_simplified(status_code: u16) -> f64 {
        match status_code {
            200..=299 => 1.0,
            300..=399 => 0.0,
            400..=499 => -1.0,
            _ => -2.0,
        }
    }
}

fn error_indicator(status_code: u16) -> f64 {
    if status_code >= 500 {
        2.0
    } else if status_code >= 400 {
        1.0
    } else {
        0.0
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}
