//! Health prober (C10) configuration: the active instance health-check loop.
//!
//! Distinct from `models::monitoring::HealthConfig`, which configures this
//! process's own `/health` endpoint rather than the backend instances it
//! probes.

use serde::{Deserialize, Serialize};

fn default_probe_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

/// Active health-check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthProbeConfig {
    /// Period between probe rounds.
    #[serde(default = "default_probe_ms")]
    pub probe_ms: u64,
    /// Per-instance probe HTTP timeout.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for HealthProbeConfig {
    fn default() -> Self {
        Self {
            probe_ms: default_probe_ms(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl HealthProbeConfig {
    pub fn merge(mut self, other: Self) -> Self {
        if other.probe_ms != default_probe_ms() {
            self.probe_ms = other.probe_ms;
        }
        if other.probe_timeout_ms != default_probe_timeout_ms() {
            self.probe_timeout_ms = other.probe_timeout_ms;
        }
        self
    }
}
