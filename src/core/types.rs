//! Shared data model for the routing core: instances, service views, metrics,
//! encoded state, actions, Q-table entries, experiences and benchmark stats.
//!
//! These types are intentionally plain data — the behavior that produces and
//! consumes them lives in the sibling `core::` modules (C1-C10).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single backend instance as seen by the registry.
///
/// Identity is the stable `name` (e.g. `cart-service-7f3a`). `url` is where
/// the dispatcher forwards proxied requests; `health_url` is polled by the
/// health prober (C10).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instance {
    pub service_name: String,
    pub instance_name: String,
    pub url: String,
    pub health_url: String,
    #[serde(default)]
    pub healthy: bool,
    /// Last time the health prober or registry producer observed this instance, RFC3339.
    #[serde(default)]
    pub last_health_check: Option<chrono::DateTime<chrono::Utc>>,
    /// Last observed health-probe response time, in milliseconds.
    #[serde(default)]
    pub response_time_ms: Option<f64>,
}

impl Instance {
    pub fn action(&self) -> Action {
        self.instance_name.clone()
    }
}

/// An instance name, scoped implicitly to a service. The sole non-state
/// component of a Q-table key.
pub type Action = String;

/// A service's current set of instances plus an atomic round-robin cursor.
///
/// Invariant: `healthy_instances() ⊆ instances`; the cursor is read modulo
/// `healthy_instances().len()` at selection time, never stored pre-divided.
#[derive(Debug, Clone, Default)]
pub struct ServiceView {
    pub instances: Vec<Instance>,
}

impl ServiceView {
    pub fn healthy_instances(&self) -> Vec<&Instance> {
        self.instances.iter().filter(|i| i.healthy).collect()
    }
}

/// Raw per-instance telemetry as pulled from the metrics view (C2). All
/// fields are non-negative; a `true` in the matching `*_unavailable` field
/// means the source query failed and the value was defaulted to 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InstanceMetrics {
    pub cpu_pct: f64,
    pub mem_pct: f64,
    pub avg_latency_ms: f64,
    pub error_rate_pct: f64,
    pub reqs_per_sec: f64,
    pub uptime_sec: f64,
    /// True when none of the underlying PromQL queries resolved a value —
    /// the reward calculator and the safe-exploration filter both react to
    /// this (spec: "tagged unavailable").
    #[serde(default)]
    pub unavailable: bool,
}

impl Default for InstanceMetrics {
    fn default() -> Self {
        Self {
            cpu_pct: 0.0,
            mem_pct: 0.0,
            avg_latency_ms: 0.0,
            error_rate_pct: 0.0,
            reqs_per_sec: 0.0,
            uptime_sec: 0.0,
            unavailable: true,
        }
    }
}

/// Arity of each binned dimension: `(cpuBin, memBin, latBin, errBin, rpsBin)`.
///
/// Two `InstanceMetrics` that encode to equal `State`s are, by construction,
/// indistinguishable to the Q-table (: "the state is the sole Q-table
/// key component besides the action").
pub type State = (u8, u8, u8, u8, u8);

/// The all-zero state, used when the metrics view is circuit-broken
/// ("unknown -> explore", §4.2) or an encoder input was out of range
/// (`INVALID_STATE`).
pub const ZERO_STATE: State = (0, 0, 0, 0, 0);

/// A completed decide/feedback pair, the unit the Q-update path consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub service_name: String,
    pub pre_state: State,
    pub action: Action,
    pub reward: f64,
    pub post_state: State,
    pub meta: ExperienceMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceMeta {
    pub path: Option<String>,
    pub status: u16,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// How a decision was ultimately produced. Reported on `/decide` and tallied
/// in `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Exploit,
    Explore,
    Fallback,
}

/// The three dispatch algorithms the switchboard (C9) can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    RoundRobin,
    LeastConnections,
    RlAgent,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round-robin",
            Self::LeastConnections => "least-connections",
            Self::RlAgent => "rl-agent",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round-robin" | "round_robin" => Ok(Self::RoundRobin),
            "least-connections" | "least_connections" => Ok(Self::LeastConnections),
            "rl-agent" | "rl_agent" => Ok(Self::RlAgent),
            other => Err(format!("unknown algorithm: {other}")),
        }
    }
}

/// Rolling response-time samples backing the benchmark accumulator's
/// percentile math. Bounded so a long-running benchmark window doesn't grow
/// without limit; only the percentiles need to survive, not exact replay.
#[derive(Debug, Clone)]
pub struct ResponseTimeSamples {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl ResponseTimeSamples {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    pub fn push(&mut self, value_ms: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value_ms);
    }

    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let idx = ((p / 100.0) * (sorted.len() as f64 - 1.0)).round() as usize;
        sorted.get(idx).copied()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for ResponseTimeSamples {
    fn default() -> Self {
        Self::new(10_000)
    }
}
