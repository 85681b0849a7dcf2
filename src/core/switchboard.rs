//! Algorithm Switchboard (C9): holds the active dispatch algorithm and
//! chooses one instance per request, plus the online A/B benchmark
//! accumulator that tracks per-algorithm outcome stats.
//!
//! Tagged-enum dispatch rather than a trait object, since there are exactly
//! three algorithms and the requirement is switching between them at
//! runtime, not extending the set.
//!
//! Round-robin cursor and least-connections tie-break follow
//! `StrategyExecutor`'s pattern elsewhere in this crate: an atomic counter
//! per service, `fetch_add` then modulo the candidate count.

use crate::core::dispatcher::ConnectionCounters;
use crate::core::types::{Action, Algorithm, Instance, ResponseTimeSamples};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Switchboard {
    algorithm: Mutex<Algorithm>,
    round_robin_cursors: DashMap<String, AtomicUsize>,
    connections: Arc<ConnectionCounters>,
    benchmark: BenchmarkAccumulator,
}

impl Switchboard {
    pub fn new(default_algorithm: Algorithm, connections: Arc<ConnectionCounters>) -> Self {
        Self {
            algorithm: Mutex::new(default_algorithm),
            round_robin_cursors: DashMap::new(),
            connections,
            benchmark: BenchmarkAccumulator::new(),
        }
    }

    pub fn current_algorithm(&self) -> Algorithm {
        *self.algorithm.lock()
    }

    pub fn set_algorithm(&self, algorithm: Algorithm) {
        *self.algorithm.lock() = algorithm;
    }

    /// Chooses among `instances` for `service_name` using `algorithm`
    /// (usually `self.current_algorithm()`, but the benchmark harness can
    /// force a specific one to run a comparison round).
    pub fn choose_with(&self, service_name: &str, instances: &[Instance], algorithm: Algorithm) -> Option<Action> {
        if instances.is_empty() {
            return None;
        }
        match algorithm {
            Algorithm::RoundRobin => Some(self.round_robin(service_name, instances)),
            Algorithm::LeastConnections => Some(self.least_connections(instances)),
            Algorithm::RlAgent => None, // caller delegates to the decision service
        }
    }

    fn round_robin(&self, service_name: &str, instances: &[Instance]) -> Action {
        let cursor = self
            .round_robin_cursors
            .entry(service_name.to_string())
            .or_insert_with(|| AtomicUsize::new(0));
        let idx = cursor.fetch_add(1, Ordering::Relaxed) % instances.len();
        instances[idx].action()
    }

    fn least_connections(&self, instances: &[Instance]) -> Action {
        instances
            .iter()
            .min_by_key(|i| self.connections.get(&i.instance_name))
            .map(|i| i.action())
            .expect("instances is non-empty")
    }

    pub fn benchmark(&self) -> &BenchmarkAccumulator {
        &self.benchmark
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkState {
    Idle,
    Running,
    Stopped,
}

#[derive(Default)]
struct AlgorithmStats {
    requests: AtomicU64,
    errors: AtomicU64,
    samples: Mutex<ResponseTimeSamples>,
}

impl AlgorithmStats {
    fn record(&self, latency_ms: f64, is_error: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.samples.lock().push(latency_ms);
    }

    /// `active_duration` is the benchmark's wall-clock elapsed time, used to
    /// derive throughput (§4.9: "requests ÷ active duration"). `None` (or a
    /// non-positive duration) reports zero throughput rather than dividing
    /// by zero.
    fn snapshot(&self, active_duration: Option<Duration>) -> AlgorithmStatsSnapshot {
        let samples = self.samples.lock();
        let requests = self.requests.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let throughput_rps = match active_duration {
            Some(d) if d.as_secs_f64() > 0.0 => requests as f64 / d.as_secs_f64(),
            _ => 0.0,
        };
        AlgorithmStatsSnapshot {
            requests,
            errors,
            error_rate_pct: if requests > 0 {
                errors as f64 / requests as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms: samples.mean().unwrap_or(0.0),
            p50_latency_ms: samples.percentile(50.0).unwrap_or(0.0),
            p95_latency_ms: samples.percentile(95.0).unwrap_or(0.0),
            p99_latency_ms: samples.percentile(99.0).unwrap_or(0.0),
            throughput_rps,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmStatsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub error_rate_pct: f64,
    pub avg_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    /// Requests served per second of active benchmark duration.
    pub throughput_rps: f64,
}

/// Tracks per-algorithm outcome stats across an online A/B run, so an
/// operator can compare the RL policy against the baselines without
/// standing up a separate harness.
pub struct BenchmarkAccumulator {
    state: Mutex<BenchmarkState>,
    start_time: Mutex<Option<Instant>>,
    duration: Mutex<Option<Duration>>,
    round_robin: AlgorithmStats,
    least_connections: AlgorithmStats,
    rl_agent: AlgorithmStats,
}

impl BenchmarkAccumulator {
    fn new() -> Self {
        Self {
            state: Mutex::new(BenchmarkState::Idle),
            start_time: Mutex::new(None),
            duration: Mutex::new(None),
            round_robin: AlgorithmStats::default(),
            least_connections: AlgorithmStats::default(),
            rl_agent: AlgorithmStats::default(),
        }
    }

    /// Begins a run, optionally bounded by `duration` (the spec's
    /// `durationMinutes`). The caller is responsible for applying
    /// `startAlgorithm` to the switchboard before calling this.
    pub fn start(&self, duration: Option<Duration>) {
        *self.state.lock() = BenchmarkState::Running;
        *self.start_time.lock() = Some(Instant::now());
        *self.duration.lock() = duration;
    }

    /// `true` once a configured duration has elapsed on a running benchmark.
    /// The caller (the benchmark route or a background sweep) decides
    /// whether to actually call `stop()` on this signal.
    pub fn is_past_duration(&self) -> bool {
        match (*self.start_time.lock(), *self.duration.lock()) {
            (Some(start), Some(limit)) => start.elapsed() >= limit,
            _ => false,
        }
    }

    pub fn stop(&self) {
        *self.state.lock() = BenchmarkState::Stopped;
    }

    /// Clears accumulated stats and returns to `Idle`, ready for a fresh run.
    pub fn reset(&self) {
        *self.state.lock() = BenchmarkState::Idle;
        *self.start_time.lock() = None;
        *self.duration.lock() = None;
        self.clear_counters(None);
    }

    /// Zeroes counters for one algorithm, or all three, without touching
    /// `state` or `start_time` — usable mid-run to discard a bad sample
    /// window without ending the benchmark.
    pub fn reset_counters(&self, algorithm: Option<Algorithm>) {
        self.clear_counters(algorithm);
    }

    fn clear_counters(&self, algorithm: Option<Algorithm>) {
        let targets: &[&AlgorithmStats] = match algorithm {
            Some(algorithm) => &[self.stats_for(algorithm)],
            None => &[&self.round_robin, &self.least_connections, &self.rl_agent],
        };
        for stats in targets {
            stats.samples.lock().clear();
            stats.requests.store(0, Ordering::Relaxed);
            stats.errors.store(0, Ordering::Relaxed);
        }
    }

    pub fn status(&self) -> BenchmarkState {
        *self.state.lock()
    }

    /// Wall-clock time since the current (or most recent) run started.
    /// `None` if the benchmark has never been started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.lock().map(|t| t.elapsed())
    }

    pub fn is_running(&self) -> bool {
        self.status() == BenchmarkState::Running
    }

    fn stats_for(&self, algorithm: Algorithm) -> &AlgorithmStats {
        match algorithm {
            Algorithm::RoundRobin => &self.round_robin,
            Algorithm::LeastConnections => &self.least_connections,
            Algorithm::RlAgent => &self.rl_agent,
        }
    }

    /// Records one outcome against whichever algorithm served it. No-op
    /// outside a running benchmark, so idle traffic doesn't pollute the
    /// next run's baseline.
    pub fn record_outcome(&self, algorithm: Algorithm, latency_ms: f64, is_error: bool) {
        if !self.is_running() {
            return;
        }
        self.stats_for(algorithm).record(latency_ms, is_error);
    }

    pub fn results(&self) -> BenchmarkResults {
        let active_duration = self.elapsed();
        let round_robin = self.round_robin.snapshot(active_duration);
        let rl_agent = self.rl_agent.snapshot(active_duration);
        let rl_vs_round_robin = AlgorithmComparison::compute(&round_robin, &rl_agent);

        BenchmarkResults {
            state: self.status(),
            least_connections: self.least_connections.snapshot(active_duration),
            round_robin,
            rl_agent,
            rl_vs_round_robin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResults {
    #[serde(skip)]
    pub state: BenchmarkState,
    pub round_robin: AlgorithmStatsSnapshot,
    pub least_connections: AlgorithmStatsSnapshot,
    pub rl_agent: AlgorithmStatsSnapshot,
    pub rl_vs_round_robin: Option<AlgorithmComparison>,
}

/// How the RL policy compared against the round-robin baseline over the
/// current run. `None` until both sides have served at least one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmComparison {
    pub latency_improvement_pct: f64,
    pub error_rate_improvement_pct: f64,
}

impl AlgorithmComparison {
    fn compute(round_robin: &AlgorithmStatsSnapshot, rl_agent: &AlgorithmStatsSnapshot) -> Option<Self> {
        if round_robin.requests == 0 || rl_agent.requests == 0 {
            return None;
        }
        Some(Self {
            latency_improvement_pct: percent_improvement(round_robin.avg_latency_ms, rl_agent.avg_latency_ms),
            error_rate_improvement_pct: percent_improvement(round_robin.error_rate_pct, rl_agent.error_rate_pct),
        })
    }
}

/// Positive when `candidate` beats `baseline` (lower is better for both
/// latency and error rate). Zero when the baseline itself is zero, since a
/// zero baseline has no meaningful percentage improvement.
fn percent_improvement(baseline: f64, candidate: f64) -> f64 {
    if baseline <= 0.0 {
        return 0.0;
    }
    (baseline - candidate) / baseline * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(name: &str) -> Instance {
        Instance {
            service_name: "svc".to_string(),
            instance_name: name.to_string(),
            url: format!("http://{name}"),
            health_url: format!("http://{name}/health"),
            healthy: true,
            last_health_check: None,
            response_time_ms: None,
        }
    }

    #[test]
    fn round_robin_cycles_through_instances() {
        let switchboard = Switchboard::new(Algorithm::RoundRobin, Arc::new(ConnectionCounters::new()));
        let instances = vec![instance("p1"), instance("p2"), instance("p3")];
        let picks: Vec<Action> = (0..6)
            .map(|_| switchboard.choose_with("svc", &instances, Algorithm::RoundRobin).unwrap())
            .collect();
        assert_eq!(picks, vec!["p1", "p2", "p3", "p1", "p2", "p3"]);
    }

    #[test]
    fn least_connections_prefers_the_idle_instance() {
        let connections = Arc::new(ConnectionCounters::new());
        connections.inc("p1");
        connections.inc("p1");
        connections.inc("p2");
        let switchboard = Switchboard::new(Algorithm::LeastConnections, connections);
        let instances = vec![instance("p1"), instance("p2")];
        let chosen = switchboard
            .choose_with("svc", &instances, Algorithm::LeastConnections)
            .unwrap();
        assert_eq!(chosen, "p2");
    }

    #[test]
    fn benchmark_ignores_outcomes_while_idle() {
        let switchboard = Switchboard::new(Algorithm::RoundRobin, Arc::new(ConnectionCounters::new()));
        switchboard.benchmark().record_outcome(Algorithm::RoundRobin, 10.0, false);
        assert_eq!(switchboard.benchmark().results().round_robin.requests, 0);
    }

    #[test]
    fn benchmark_accumulates_while_running_and_clears_on_reset() {
        let switchboard = Switchboard::new(Algorithm::RoundRobin, Arc::new(ConnectionCounters::new()));
        switchboard.benchmark().start(None);
        switchboard.benchmark().record_outcome(Algorithm::RoundRobin, 10.0, false);
        switchboard.benchmark().record_outcome(Algorithm::RoundRobin, 20.0, true);
        let results = switchboard.benchmark().results();
        assert_eq!(results.round_robin.requests, 2);
        assert_eq!(results.round_robin.errors, 1);

        switchboard.benchmark().reset();
        assert_eq!(switchboard.benchmark().results().round_robin.requests, 0);
        assert_eq!(switchboard.benchmark().status(), BenchmarkState::Idle);
    }

    #[test]
    fn reset_counters_clears_one_algorithm_without_ending_the_run() {
        let switchboard = Switchboard::new(Algorithm::RoundRobin, Arc::new(ConnectionCounters::new()));
        let benchmark = switchboard.benchmark();
        benchmark.start(None);
        benchmark.record_outcome(Algorithm::RoundRobin, 10.0, false);
        benchmark.record_outcome(Algorithm::RlAgent, 5.0, false);

        benchmark.reset_counters(Some(Algorithm::RoundRobin));

        assert_eq!(benchmark.results().round_robin.requests, 0);
        assert_eq!(benchmark.results().rl_agent.requests, 1);
        assert!(benchmark.is_running());
    }

    #[test]
    fn reset_counters_with_no_algorithm_clears_all_but_keeps_running() {
        let switchboard = Switchboard::new(Algorithm::RoundRobin, Arc::new(ConnectionCounters::new()));
        let benchmark = switchboard.benchmark();
        benchmark.start(None);
        benchmark.record_outcome(Algorithm::RoundRobin, 10.0, false);
        benchmark.record_outcome(Algorithm::RlAgent, 5.0, false);

        benchmark.reset_counters(None);

        assert_eq!(benchmark.results().round_robin.requests, 0);
        assert_eq!(benchmark.results().rl_agent.requests, 0);
        assert!(benchmark.is_running());
    }

    #[test]
    fn elapsed_is_none_before_start_and_some_after() {
        let switchboard = Switchboard::new(Algorithm::RoundRobin, Arc::new(ConnectionCounters::new()));
        let benchmark = switchboard.benchmark();
        assert!(benchmark.elapsed().is_none());
        benchmark.start(None);
        assert!(benchmark.elapsed().is_some());
    }

    #[test]
    fn comparison_is_none_until_both_algorithms_have_served_a_request() {
        let switchboard = Switchboard::new(Algorithm::RoundRobin, Arc::new(ConnectionCounters::new()));
        let benchmark = switchboard.benchmark();
        benchmark.start(None);
        benchmark.record_outcome(Algorithm::RoundRobin, 100.0, false);
        assert!(benchmark.results().rl_vs_round_robin.is_none());

        benchmark.record_outcome(Algorithm::RlAgent, 50.0, false);
        let comparison = benchmark.results().rl_vs_round_robin.expect("both algorithms served");
        assert!(comparison.latency_improvement_pct > 0.0);
    }
}
