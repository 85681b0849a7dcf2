//! Decision Service (C7): the orchestration layer behind `/decide` and
//! `/feedback`. Composes the registry view (C1), metrics view (C2), state
//! encoder (C3), action selector (C5) and Q-table (C6) into the two
//! operations the HTTP surface exposes.
//!
//! `/decide` is cached for `decision_cache_ms` per `(service, hash(A))`;
//! a cache hit still feeds the action selector's anti-concentration
//! history so a cached run of identical decisions still counts toward
//! rotation on the next miss.

use crate::config::models::RlConfig;
use crate::core::action_selector::{ActionSelector, Candidate};
use crate::core::health_prober::HealthProber;
use crate::core::metrics_view::MetricsView;
use crate::core::q_table::QTable;
use crate::core::registry::RegistryView;
use crate::core::reward::{RewardCalculator, RewardContext};
use crate::core::state_encoder::StateEncoder;
use crate::core::types::{Action, DecisionType, Instance, State};
use crate::utils::error::{GatewayError, Result};
use dashmap::DashMap;
use moka::future::Cache;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The subset of instances a given service currently has, filtered by both
/// the registry's reported health and the active prober's overlay (spec
/// §4.10: "unhealthy instances are excluded from the healthy view").
pub fn healthy_candidates(registry: &RegistryView, prober: &HealthProber, service_name: &str) -> Vec<Instance> {
    registry
        .instances(service_name)
        .into_iter()
        .filter(|i| i.healthy && prober.is_healthy(&i.instance_name))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideResponse {
    pub selected_pod: Action,
    pub confidence: f64,
    pub decision_type: DecisionType,
    pub decision_time_ms: f64,
    pub available_pods: Vec<Action>,
}

#[derive(Debug, Clone)]
pub struct FeedbackInput {
    pub service_name: String,
    pub selected_pod: Action,
    pub response_time_ms: f64,
    pub status_code: u16,
    pub error_occurred: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub rl_agent_ready: bool,
    pub q_table_size: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub q_table_size: usize,
    pub current_epsilon: f64,
    pub episode_count: u64,
    pub total_decisions: u64,
    pub average_reward: f64,
}

fn candidate_set_hash(actions: &[Action]) -> u64 {
    let mut sorted = actions.to_vec();
    sorted.sort();
    let mut hasher = DefaultHasher::new();
    sorted.hash(&mut hasher);
    hasher.finish()
}

struct RunningAverage {
    value: Mutex<f64>,
}

impl RunningAverage {
    const ALPHA: f64 = 0.01;

    fn new() -> Self {
        Self { value: Mutex::new(0.0) }
    }

    fn update(&self, sample: f64) {
        let mut value = self.value.lock();
        *value = *value * (1.0 - Self::ALPHA) + sample * Self::ALPHA;
    }

    fn get(&self) -> f64 {
        *self.value.lock()
    }
}

/// Per-instance historical mean post-latency, backing the reward
/// calculator's stability term (§4.4: "within 20% of its historical mean").
/// An exponential moving average so old observations decay rather than
/// pinning the mean to a pod's first few requests forever.
struct LatencyHistory {
    mean: Mutex<Option<f64>>,
}

impl LatencyHistory {
    const ALPHA: f64 = 0.1;

    fn new() -> Self {
        Self { mean: Mutex::new(None) }
    }

    /// `None` until this pod has at least one prior observation.
    fn get(&self) -> Option<f64> {
        *self.mean.lock()
    }

    fn update(&self, sample_ms: f64) {
        let mut mean = self.mean.lock();
        *mean = Some(match *mean {
            Some(prev) => prev * (1.0 - Self::ALPHA) + sample_ms * Self::ALPHA,
            None => sample_ms,
        });
    }
}

pub struct DecisionService {
    registry: Arc<RegistryView>,
    metrics: Arc<MetricsView>,
    prober: Arc<HealthProber>,
    encoder: Arc<StateEncoder>,
    selector: Arc<ActionSelector>,
    q_table: Arc<QTable>,
    reward_calc: RewardCalculator,
    confidence_threshold: f64,
    decision_cache: Cache<(String, u64), Arc<DecideResponse>>,
    /// Pre-decision state per `(service, pod)`, consulted at feedback time
    /// to recover the `s` half of the `(s,a,r,s')` tuple. Overwritten by the
    /// next decide for the same pod (best-effort single-in-flight
    /// assumption, matching the ordering guarantee in §4.7).
    pending_states: DashMap<(String, Action), State>,
    fallback_cursors: DashMap<String, AtomicUsize>,
    total_decisions: AtomicU64,
    average_reward: RunningAverage,
    /// Per-`(service, pod)` historical mean post-latency for the reward
    /// calculator's stability term.
    latency_history: DashMap<(String, Action), LatencyHistory>,
}

impl DecisionService {
    pub fn new(
        registry: Arc<RegistryView>,
        metrics: Arc<MetricsView>,
        prober: Arc<HealthProber>,
        q_table: Arc<QTable>,
        rl_config: &RlConfig,
    ) -> Self {
        let encoder = Arc::new(StateEncoder::new(rl_config.bin_widths.clone()));
        let selector = Arc::new(ActionSelector::new(rl_config.clone()));
        let reward_calc = RewardCalculator::new(rl_config.reward_weights, rl_config.stability_tolerance);
        let decision_cache = Cache::builder()
            .time_to_live(Duration::from_millis(rl_config.decision_cache_ttl_ms))
            .max_capacity(4096)
            .build();

        Self {
            registry,
            metrics,
            prober,
            encoder,
            selector,
            q_table,
            reward_calc,
            confidence_threshold: rl_config.confidence_threshold,
            decision_cache,
            pending_states: DashMap::new(),
            fallback_cursors: DashMap::new(),
            total_decisions: AtomicU64::new(0),
            average_reward: RunningAverage::new(),
            latency_history: DashMap::new(),
        }
    }

    pub async fn decide(&self, service_name: &str) -> Result<DecideResponse> {
        let started = Instant::now();
        if self.registry.is_stale() {
            tracing::warn!(
                service = service_name,
                "registry snapshot is stale (REGISTRY_STALE), deciding against possibly-outdated instance data"
            );
        }
        let candidates = healthy_candidates(&self.registry, &self.prober, service_name);
        if candidates.is_empty() {
            return Err(GatewayError::no_instances(service_name));
        }

        let actions: Vec<Action> = candidates.iter().map(|i| i.action()).collect();
        let cache_key = (service_name.to_string(), candidate_set_hash(&actions));

        if let Some(cached) = self.decision_cache.get(&cache_key).await {
            self.pending_states.insert(
                (service_name.to_string(), cached.selected_pod.clone()),
                self.last_known_state(service_name, &cached.selected_pod),
            );
            return Ok((*cached).clone());
        }

        let metrics = self
            .metrics
            .fetch_metrics(service_name, &actions)
            .await;

        let decision_candidates: Vec<Candidate> = candidates
            .iter()
            .map(|instance| {
                let m = metrics
                    .get(&instance.instance_name)
                    .copied()
                    .unwrap_or_default();
                let state = if self.metrics.is_circuit_open() || m.unavailable {
                    StateEncoder::unknown_state()
                } else {
                    self.encoder.encode(&m)
                };
                Candidate {
                    action: instance.action(),
                    state,
                    metrics: m,
                }
            })
            .collect();

        let selection = self
            .selector
            .select(service_name, &decision_candidates, &self.q_table)
            .expect("decision_candidates is non-empty");

        let (selected_pod, state, decision_type, confidence) =
            if selection.decision_type == DecisionType::Exploit
                && selection.confidence < self.confidence_threshold
            {
                let fallback_pod = self.round_robin_fallback(service_name, &actions);
                let fallback_state = decision_candidates
                    .iter()
                    .find(|c| c.action == fallback_pod)
                    .map(|c| c.state)
                    .unwrap_or(crate::core::types::ZERO_STATE);
                (fallback_pod, fallback_state, DecisionType::Fallback, selection.confidence)
            } else {
                (selection.action, selection.state, selection.decision_type, selection.confidence)
            };

        self.pending_states
            .insert((service_name.to_string(), selected_pod.clone()), state);
        self.total_decisions.fetch_add(1, Ordering::Relaxed);

        let response = DecideResponse {
            selected_pod,
            confidence,
            decision_type,
            decision_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            available_pods: actions,
        };

        self.decision_cache
            .insert(cache_key, Arc::new(response.clone()))
            .await;

        Ok(response)
    }

    fn round_robin_fallback(&self, service_name: &str, actions: &[Action]) -> Action {
        let cursor = self
            .fallback_cursors
            .entry(service_name.to_string())
            .or_insert_with(|| AtomicUsize::new(0));
        let idx = cursor.fetch_add(1, Ordering::Relaxed) % actions.len();
        actions[idx].clone()
    }

    fn last_known_state(&self, service_name: &str, pod: &str) -> State {
        self.pending_states
            .get(&(service_name.to_string(), pod.to_string()))
            .map(|v| *v)
            .unwrap_or(crate::core::types::ZERO_STATE)
    }

    pub async fn feedback(&self, input: FeedbackInput) -> Result<()> {
        let pre_state = self
            .pending_states
            .remove(&(input.service_name.clone(), input.selected_pod.clone()))
            .map(|(_, s)| s)
            .unwrap_or(crate::core::types::ZERO_STATE);

        let post_metrics = self
            .metrics
            .fetch_metrics(&input.service_name, std::slice::from_ref(&input.selected_pod))
            .await;
        let metrics = post_metrics
            .get(&input.selected_pod)
            .copied()
            .unwrap_or_default();

        let post_state = if self.metrics.is_circuit_open() || metrics.unavailable {
            StateEncoder::unknown_state()
        } else {
            self.encoder.encode(&metrics)
        };

        let reward = if self.metrics.is_circuit_open() {
            RewardCalculator::compute_simplified(input.status_code)
        } else {
            let healthy = healthy_candidates(&self.registry, &self.prober, &input.service_name);
            let healthy_metrics = self
                .metrics
                .fetch_metrics(
                    &input.service_name,
                    &healthy.iter().map(|i| i.instance_name.clone()).collect::<Vec<_>>(),
                )
                .await;
            let mut cpu_pcts = [0.0; 8];
            let count = healthy_metrics.values().take(8).count();
            for (slot, m) in cpu_pcts.iter_mut().zip(healthy_metrics.values()) {
                *slot = m.cpu_pct;
            }
            let history_key = (input.service_name.clone(), input.selected_pod.clone());
            let historical_mean_latency_ms = self
                .latency_history
                .get(&history_key)
                .and_then(|h| h.get());
            let ctx = RewardContext {
                response_time_ms: input.response_time_ms,
                post_reqs_per_sec: metrics.reqs_per_sec,
                healthy_cpu_pcts: cpu_pcts,
                healthy_cpu_count: count,
                post_latency_ms: metrics.avg_latency_ms,
                historical_mean_latency_ms,
            };
            if !metrics.unavailable {
                self.latency_history
                    .entry(history_key)
                    .or_insert_with(LatencyHistory::new)
                    .update(metrics.avg_latency_ms);
            }
            self.reward_calc.compute_full(input.status_code, &ctx)
        };

        let legal_next_actions: Vec<Action> = healthy_candidates(&self.registry, &self.prober, &input.service_name)
            .into_iter()
            .map(|i| i.action())
            .collect();

        self.q_table
            .update(pre_state, input.selected_pod, reward, post_state, &legal_next_actions);
        self.average_reward.update(reward);

        Ok(())
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok",
            rl_agent_ready: self.registry.has_snapshot(),
            q_table_size: self.q_table.len(),
        }
    }

    pub fn stats(&self) -> StatsResponse {
        StatsResponse {
            q_table_size: self.q_table.len(),
            current_epsilon: self.selector.current_epsilon(),
            episode_count: self.selector.episode_count(),
            total_decisions: self.total_decisions.load(Ordering::Relaxed),
            average_reward: self.average_reward.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_average_tracks_recent_rewards() {
        let avg = RunningAverage::new();
        for _ in 0..200 {
            avg.update(1.0);
        }
        assert!(avg.get() > 0.8);
    }

    #[test]
    fn candidate_set_hash_is_order_independent() {
        let a = vec!["p1".to_string(), "p2".to_string()];
        let b = vec!["p2".to_string(), "p1".to_string()];
        assert_eq!(candidate_set_hash(&a), candidate_set_hash(&b));
    }
}
