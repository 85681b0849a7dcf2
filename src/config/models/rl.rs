//! Routing policy engine configuration: state encoder bin widths, reward
//! weights, Q-learning hyperparameters and the action selector's
//! exploration/confidence knobs.

use serde::{Deserialize, Serialize};

/// Fixed-width binning config for one metric dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BinConfig {
    pub width: f64,
    pub max_bin: u8,
}

/// Per-metric bin widths, `[MODULE] State Encoder`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BinWidthsConfig {
    pub cpu: BinConfig,
    pub mem: BinConfig,
    pub latency_ms: BinConfig,
    pub error_rate: BinConfig,
    pub reqs_per_sec: BinConfig,
}

impl Default for BinWidthsConfig {
    fn default() -> Self {
        Self {
            cpu: BinConfig { width: 25.0, max_bin: 4 },
            mem: BinConfig { width: 25.0, max_bin: 4 },
            latency_ms: BinConfig { width: 100.0, max_bin: 4 },
            error_rate: BinConfig { width: 5.0, max_bin: 2 },
            reqs_per_sec: BinConfig { width: 50.0, max_bin: 4 },
        }
    }
}

/// Reward component weights, re-normalized to sum to 1.0 at load time
///.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RewardWeightsConfig {
    pub latency: f64,
    pub error: f64,
    pub throughput: f64,
    pub balance: f64,
    pub stability: f64,
}

impl Default for RewardWeightsConfig {
    fn default() -> Self {
        Self {
            latency: 0.35,
            error: 0.35,
            throughput: 0.15,
            balance: 0.10,
            stability: 0.05,
        }
    }
}

impl RewardWeightsConfig {
    /// Re-normalize the five weights to sum to 1.0. Falls back to the
    /// defaults if all weights are non-positive (can't normalize a zero
    /// vector).
    pub fn normalized(&self) -> Self {
        let sum = self.latency + self.error + self.throughput + self.balance + self.stability;
        if sum <= 0.0 {
            return Self::default();
        }
        Self {
            latency: self.latency / sum,
            error: self.error / sum,
            throughput: self.throughput / sum,
            balance: self.balance / sum,
            stability: self.stability / sum,
        }
    }
}

fn default_learning_rate() -> f64 {
    0.3
}
fn default_discount_factor() -> f64 {
    0.95
}
fn default_epsilon_start() -> f64 {
    0.25
}
fn default_epsilon_min() -> f64 {
    0.01
}
fn default_epsilon_decay() -> f64 {
    0.99
}
fn default_confidence_threshold() -> f64 {
    0.3
}
fn default_decision_cache_ttl_ms() -> u64 {
    100
}
fn default_ucb_c() -> f64 {
    2.0
}
fn default_anti_concentration_run() -> u32 {
    3
}
fn default_safe_cpu_pct() -> f64 {
    95.0
}
fn default_safe_mem_pct() -> f64 {
    95.0
}
fn default_safe_error_rate_pct() -> f64 {
    10.0
}
fn default_entropy_boost_threshold() -> f64 {
    0.6
}
fn default_exploit_band_min() -> f64 {
    0.2
}
fn default_exploit_band_relative() -> f64 {
    0.15
}
fn default_stability_tolerance() -> f64 {
    0.2
}
fn default_q_table_snapshot_path() -> Option<String> {
    None
}

/// Routing policy engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RlConfig {
    /// Bellman update learning rate (alpha).
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Future-reward discount (gamma).
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,
    /// Initial exploration rate.
    #[serde(default = "default_epsilon_start")]
    pub epsilon_start: f64,
    /// Floor for the exploration rate.
    #[serde(default = "default_epsilon_min")]
    pub epsilon_min: f64,
    /// Per-episode epsilon multiplier.
    #[serde(default = "default_epsilon_decay")]
    pub epsilon_decay: f64,
    /// Below this confidence, `/decide` declines the RL choice (§4.5,
    /// §4.7).
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// `/decide` response cache TTL, keyed by `(serviceName, hash(A))`.
    #[serde(default = "default_decision_cache_ttl_ms")]
    pub decision_cache_ttl_ms: u64,
    /// UCB exploration constant `c` used to break explore-path ties.
    #[serde(default = "default_ucb_c")]
    pub ucb_c: f64,
    /// Number of consecutive same-action selections that trigger
    /// anti-concentration rotation.
    #[serde(default = "default_anti_concentration_run")]
    pub anti_concentration_run: u32,
    /// Safe-exploration filter: exclude candidates above this CPU%.
    #[serde(default = "default_safe_cpu_pct")]
    pub safe_cpu_pct: f64,
    /// Safe-exploration filter: exclude candidates above this memory%.
    #[serde(default = "default_safe_mem_pct")]
    pub safe_mem_pct: f64,
    /// Safe-exploration filter: exclude candidates above this error rate%.
    #[serde(default = "default_safe_error_rate_pct")]
    pub safe_error_rate_pct: f64,
    /// Entropy boost threshold, as a fraction of the uniform maximum.
    #[serde(default = "default_entropy_boost_threshold")]
    pub entropy_boost_threshold: f64,
    /// Exploit-path near-Qmax band: absolute floor.
    #[serde(default = "default_exploit_band_min")]
    pub exploit_band_min: f64,
    /// Exploit-path near-Qmax band: fraction of `|Q_max|`.
    #[serde(default = "default_exploit_band_relative")]
    pub exploit_band_relative: f64,
    /// Stability-term tolerance: post-latency within this fraction of the
    /// instance's historical mean counts as "stable".
    #[serde(default = "default_stability_tolerance")]
    pub stability_tolerance: f64,
    /// Per-metric bin widths.
    #[serde(default)]
    pub bin_widths: BinWidthsConfig,
    /// Reward component weights.
    #[serde(default)]
    pub reward_weights: RewardWeightsConfig,
    /// Optional path to persist/restore the Q-table snapshot across
    /// restarts.
    #[serde(default = "default_q_table_snapshot_path")]
    pub q_table_snapshot_path: Option<String>,
}

impl Default for RlConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            discount_factor: default_discount_factor(),
            epsilon_start: default_epsilon_start(),
            epsilon_min: default_epsilon_min(),
            epsilon_decay: default_epsilon_decay(),
            confidence_threshold: default_confidence_threshold(),
            decision_cache_ttl_ms: default_decision_cache_ttl_ms(),
            ucb_c: default_ucb_c(),
            anti_concentration_run: default_anti_concentration_run(),
            safe_cpu_pct: default_safe_cpu_pct(),
            safe_mem_pct: default_safe_mem_pct(),
            safe_error_rate_pct: default_safe_error_rate_pct(),
            entropy_boost_threshold: default_entropy_boost_threshold(),
            exploit_band_min: default_exploit_band_min(),
            exploit_band_relative: default_exploit_band_relative(),
            stability_tolerance: default_stability_tolerance(),
            bin_widths: BinWidthsConfig::default(),
            reward_weights: RewardWeightsConfig::default(),
            q_table_snapshot_path: default_q_table_snapshot_path(),
        }
    }
}

impl RlConfig {
    pub fn merge(mut self, other: Self) -> Self {
        let default = Self::default();
        if other.learning_rate != default.learning_rate {
            self.learning_rate = other.learning_rate;
        }
        if other.discount_factor != default.discount_factor {
            self.discount_factor = other.discount_factor;
        }
        if other.epsilon_start != default.epsilon_start {
            self.epsilon_start = other.epsilon_start;
        }
        if other.epsilon_min != default.epsilon_min {
            self.epsilon_min = other.epsilon_min;
        }
        if other.epsilon_decay != default.epsilon_decay {
            self.epsilon_decay = other.epsilon_decay;
        }
        if other.confidence_threshold != default.confidence_threshold {
            self.confidence_threshold = other.confidence_threshold;
        }
        if other.decision_cache_ttl_ms != default.decision_cache_ttl_ms {
            self.decision_cache_ttl_ms = other.decision_cache_ttl_ms;
        }
        if other.ucb_c != default.ucb_c {
            self.ucb_c = other.ucb_c;
        }
        if other.anti_concentration_run != default.anti_concentration_run {
            self.anti_concentration_run = other.anti_concentration_run;
        }
        if other.bin_widths != default.bin_widths {
            self.bin_widths = other.bin_widths;
        }
        if other.reward_weights != default.reward_weights {
            self.reward_weights = other.reward_weights;
        }
        if other.q_table_snapshot_path.is_some() {
            self.q_table_snapshot_path = other.q_table_snapshot_path;
        }
        self
    }
}
