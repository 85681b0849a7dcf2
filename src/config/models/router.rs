//! Algorithm switchboard (C9) and proxy dispatcher (C8) configuration.

use serde::{Deserialize, Serialize};

fn default_algorithm() -> String {
    "round-robin".to_string()
}

fn default_decision_timeout_ms() -> u64 {
    2_000
}

fn default_upstream_timeout_ms() -> u64 {
    30_000
}

fn default_feedback_queue_capacity() -> usize {
    10_000
}

fn default_benchmark_excluded_prefixes() -> Vec<String> {
    vec!["/actuator".to_string(), "/health".to_string()]
}

/// Switchboard + dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Algorithm active at startup: `round-robin` | `least-connections` |
    /// `rl-agent`.
    #[serde(default = "default_algorithm")]
    pub default_algorithm: String,
    /// Deadline for the switchboard's in-process call into the decision
    /// service when `rl-agent` is active.
    #[serde(default = "default_decision_timeout_ms")]
    pub decision_timeout_ms: u64,
    /// Per-request upstream forward timeout.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
    /// Bounded feedback queue capacity; overflow drops the oldest entry
    /// (§5).
    #[serde(default = "default_feedback_queue_capacity")]
    pub feedback_queue_capacity: usize,
    /// Path prefixes excluded from benchmark accounting.
    #[serde(default = "default_benchmark_excluded_prefixes")]
    pub benchmark_excluded_prefixes: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_algorithm: default_algorithm(),
            decision_timeout_ms: default_decision_timeout_ms(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
            feedback_queue_capacity: default_feedback_queue_capacity(),
            benchmark_excluded_prefixes: default_benchmark_excluded_prefixes(),
        }
    }
}

impl RouterConfig {
    pub fn merge(mut self, other: Self) -> Self {
        if other.default_algorithm != default_algorithm() {
            self.default_algorithm = other.default_algorithm;
        }
        if other.decision_timeout_ms != default_decision_timeout_ms() {
            self.decision_timeout_ms = other.decision_timeout_ms;
        }
        if other.upstream_timeout_ms != default_upstream_timeout_ms() {
            self.upstream_timeout_ms = other.upstream_timeout_ms;
        }
        if other.feedback_queue_capacity != default_feedback_queue_capacity() {
            self.feedback_queue_capacity = other.feedback_queue_capacity;
        }
        if other.benchmark_excluded_prefixes != default_benchmark_excluded_prefixes() {
            self.benchmark_excluded_prefixes = other.benchmark_excluded_prefixes;
        }
        self
    }
}
