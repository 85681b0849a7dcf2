//! Action Selector (C5): epsilon-greedy candidate selection with adaptive
//! epsilon, a safe-exploration filter, a UCB explore tie-break, a near-Qmax
//! exploit band with LRU tie-break, anti-concentration rotation and a
//! reported confidence score.
//!
//! Per-state visit counts and per-service recency live in `DashMap`s rather
//! than behind one lock, the same "no single contended mutex on the hot
//! path" shape `StrategyExecutor` uses for its round-robin cursor.

use crate::config::models::RlConfig;
use crate::core::q_table::QTable;
use crate::core::types::{Action, DecisionType, InstanceMetrics, State};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

const RECENT_WINDOW: usize = 20;
const MIN_ENTROPY_SAMPLES: usize = 5;

/// One routable instance as seen by the selector: its action name, the
/// encoded state of its *own* current metrics (used as the pre-state if
/// it's chosen), and the raw metrics (used by the safe-exploration filter).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub action: Action,
    pub state: State,
    pub metrics: InstanceMetrics,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub action: Action,
    pub state: State,
    pub decision_type: DecisionType,
    pub confidence: f64,
}

#[derive(Default)]
struct ServiceHistory {
    recent_actions: Mutex<VecDeque<Action>>,
}

impl ServiceHistory {
    fn push(&self, action: Action) {
        let mut recent = self.recent_actions.lock();
        if recent.len() == RECENT_WINDOW {
            recent.pop_front();
        }
        recent.push_back(action);
    }

    fn last_n_all_equal(&self, n: usize, action: &Action) -> bool {
        let recent = self.recent_actions.lock();
        if recent.len() < n {
            return false;
        }
        recent.iter().rev().take(n).all(|a| a == action)
    }

    fn entropy_is_low(&self, threshold_fraction: f64) -> bool {
        let recent = self.recent_actions.lock();
        if recent.len() < MIN_ENTROPY_SAMPLES {
            return false;
        }
        let mut counts: std::collections::HashMap<&Action, usize> = std::collections::HashMap::new();
        for a in recent.iter() {
            *counts.entry(a).or_insert(0) += 1;
        }
        let n = recent.len() as f64;
        let entropy: f64 = counts
            .values()
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.log2()
            })
            .sum();
        let max_entropy = (counts.len() as f64).log2();
        if max_entropy <= 0.0 {
            return true;
        }
        entropy < threshold_fraction * max_entropy
    }
}

/// Epsilon-greedy selector with the full exploration policy described in
/// §4.5.
pub struct ActionSelector {
    config: RlConfig,
    episode_count: AtomicU64,
    tick: AtomicU64,
    /// `n(s,a)`, used by the explore path's UCB tie-break and "least
    /// recently visited for this state" preference.
    visit_counts: DashMap<(State, Action), u64>,
    last_visit_tick: DashMap<(State, Action), u64>,
    /// Global per-action last-used tick, backing the exploit path's LRU
    /// tie-break within the near-Qmax band.
    last_used_tick: DashMap<Action, u64>,
    history: DashMap<String, ServiceHistory>,
}

impl ActionSelector {
    pub fn new(config: RlConfig) -> Self {
        Self {
            config,
            episode_count: AtomicU64::new(0),
            tick: AtomicU64::new(0),
            visit_counts: DashMap::new(),
            last_visit_tick: DashMap::new(),
            last_used_tick: DashMap::new(),
            history: DashMap::new(),
        }
    }

    pub fn episode_count(&self) -> u64 {
        self.episode_count.load(Ordering::Relaxed)
    }

    /// Current effective epsilon without the per-service entropy boost, used
    /// for `/stats` reporting where no single service is in scope.
    pub fn current_epsilon(&self) -> f64 {
        self.decayed_epsilon(self.episode_count())
    }

    fn decayed_epsilon(&self, episode: u64) -> f64 {
        let decayed = self.config.epsilon_start * self.config.epsilon_decay.powi(episode as i32);
        decayed.max(self.config.epsilon_min)
    }

    /// Selects one candidate action. Returns `None` only when `candidates`
    /// is empty; callers should have already short-circuited on
    /// `NO_INSTANCES` before reaching here.
    pub fn select(
        &self,
        service_name: &str,
        candidates: &[Candidate],
        q_table: &QTable,
    ) -> Option<Selection> {
        if candidates.is_empty() {
            return None;
        }

        let episode = self.episode_count.fetch_add(1, Ordering::Relaxed);
        let history = self
            .history
            .entry(service_name.to_string())
            .or_default();

        let mut epsilon = self.decayed_epsilon(episode);
        if history.entropy_is_low(self.config.entropy_boost_threshold) {
            epsilon = (epsilon * 2.0).min(1.0);
        }

        let tick = self.tick.fetch_add(1, Ordering::Relaxed);
        let roll: f64 = rand::random();

        let (mut chosen, mut decision_type) = if roll < epsilon {
            self.explore(candidates, q_table, tick)
        } else {
            self.exploit(candidates, q_table, tick)
        };

        if history.last_n_all_equal(self.config.anti_concentration_run as usize, &chosen.action) {
            if let Some(next) = self.next_best(candidates, q_table, &chosen.action) {
                chosen = next;
                decision_type = DecisionType::Explore;
            }
        }

        let confidence = self.confidence(candidates, q_table, &chosen);

        self.record_visit(&history, &chosen, tick);

        Some(Selection {
            action: chosen.action,
            state: chosen.state,
            decision_type,
            confidence,
        })
    }

    fn explore(&self, candidates: &[Candidate], q_table: &QTable, _tick: u64) -> (Candidate, DecisionType) {
        let safe: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| {
                c.metrics.cpu_pct <= self.config.safe_cpu_pct
                    && c.metrics.mem_pct <= self.config.safe_mem_pct
                    && c.metrics.error_rate_pct <= self.config.safe_error_rate_pct
            })
            .collect();
        let pool: Vec<&Candidate> = if safe.is_empty() {
            candidates.iter().collect()
        } else {
            safe
        };

        // Prefer the least-recently-visited-for-this-state action; break
        // ties with UCB.
        let min_visit_tick = pool
            .iter()
            .map(|c| {
                self.last_visit_tick
                    .get(&(c.state, c.action.clone()))
                    .map(|v| *v)
                    .unwrap_or(0)
            })
            .min()
            .unwrap_or(0);

        let least_recent: Vec<&Candidate> = pool
            .into_iter()
            .filter(|c| {
                self.last_visit_tick
                    .get(&(c.state, c.action.clone()))
                    .map(|v| *v)
                    .unwrap_or(0)
                    == min_visit_tick
            })
            .collect();

        let chosen = self.ucb_best(&least_recent, q_table);
        (chosen, DecisionType::Explore)
    }

    fn ucb_best(&self, pool: &[&Candidate], q_table: &QTable) -> Candidate {
        let total_visits: u64 = pool
            .iter()
            .map(|c| {
                self.visit_counts
                    .get(&(c.state, c.action.clone()))
                    .map(|v| *v)
                    .unwrap_or(0)
            })
            .sum::<u64>()
            .max(1);
        let ln_n = (total_visits as f64).ln().max(0.0);

        pool.iter()
            .max_by(|a, b| {
                self.ucb_score(a, q_table, ln_n)
                    .total_cmp(&self.ucb_score(b, q_table, ln_n))
            })
            .map(|c| (*c).clone())
            .expect("explore pool is never empty")
    }

    fn ucb_score(&self, c: &Candidate, q_table: &QTable, ln_n: f64) -> f64 {
        let n_sa = self
            .visit_counts
            .get(&(c.state, c.action.clone()))
            .map(|v| *v)
            .unwrap_or(0);
        if n_sa == 0 {
            return f64::INFINITY;
        }
        let q = q_table.get(&c.state, &c.action);
        q + self.config.ucb_c * (ln_n / n_sa as f64).sqrt()
    }

    fn exploit(&self, candidates: &[Candidate], q_table: &QTable, _tick: u64) -> (Candidate, DecisionType) {
        let q_max = candidates
            .iter()
            .map(|c| q_table.get(&c.state, &c.action))
            .fold(f64::NEG_INFINITY, f64::max);

        let band = self
            .config
            .exploit_band_min
            .max(self.config.exploit_band_relative * q_max.abs());

        let near_max: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| q_table.get(&c.state, &c.action) >= q_max - band)
            .collect();

        let chosen = near_max
            .iter()
            .min_by_key(|c| {
                self.last_used_tick
                    .get(&c.action)
                    .map(|v| *v)
                    .unwrap_or(0)
            })
            .map(|c| (**c).clone())
            .unwrap_or_else(|| candidates[0].clone());

        (chosen, DecisionType::Exploit)
    }

    /// Rotation target when the same action has won the last
    /// `config.anti_concentration_run` decisions in a row: the best-valued
    /// candidate other than the one being rotated away from.
    fn next_best(&self, candidates: &[Candidate], q_table: &QTable, exclude: &Action) -> Option<Candidate> {
        candidates
            .iter()
            .filter(|c| &c.action != exclude)
            .max_by(|a, b| {
                q_table
                    .get(&a.state, &a.action)
                    .total_cmp(&q_table.get(&b.state, &b.action))
            })
            .cloned()
    }

    /// `(Q_selected - mean(Q over A)) / (|Q_max| + eps)`, clipped to
    /// `[0, 1]`. A confident pick stands out well above the field's average.
    fn confidence(&self, candidates: &[Candidate], q_table: &QTable, chosen: &Candidate) -> f64 {
        let values: Vec<f64> = candidates
            .iter()
            .map(|c| q_table.get(&c.state, &c.action))
            .collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let q_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let q_selected = q_table.get(&chosen.state, &chosen.action);

        let denom = q_max.abs() + 1e-6;
        ((q_selected - mean) / denom).clamp(0.0, 1.0)
    }

    fn record_visit(&self, history: &ServiceHistory, chosen: &Candidate, tick: u64) {
        history.push(chosen.action.clone());
        *self
            .visit_counts
            .entry((chosen.state, chosen.action.clone()))
            .or_insert(0) += 1;
        self.last_visit_tick
            .insert((chosen.state, chosen.action.clone()), tick);
        self.last_used_tick.insert(chosen.action.clone(), tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(action: &str, state: State, cpu: f64) -> Candidate {
        Candidate {
            action: action.to_string(),
            state,
            metrics: InstanceMetrics {
                cpu_pct: cpu,
                ..Default::default()
            },
        }
    }

    #[test]
    fn empty_candidates_returns_none() {
        let selector = ActionSelector::new(RlConfig::default());
        let q = QTable::new(0.3, 0.95);
        assert!(selector.select("svc", &[], &q).is_none());
    }

    #[test]
    fn single_candidate_is_always_selected() {
        let selector = ActionSelector::new(RlConfig::default());
        let q = QTable::new(0.3, 0.95);
        let candidates = vec![candidate("p1", (0, 0, 0, 0, 0), 10.0)];
        let selection = selector.select("svc", &candidates, &q).unwrap();
        assert_eq!(selection.action, "p1");
    }

    #[test]
    fn confidence_is_clamped_to_unit_interval() {
        let selector = ActionSelector::new(RlConfig::default());
        let q = QTable::new(0.3, 0.95);
        q.update((0, 0, 0, 0, 0), "p1".to_string(), 1.0, (0, 0, 0, 0, 0), &[]);
        let candidates = vec![
            candidate("p1", (0, 0, 0, 0, 0), 10.0),
            candidate("p2", (0, 0, 0, 0, 0), 10.0),
        ];
        let selection = selector.select("svc", &candidates, &q).unwrap();
        assert!((0.0..=1.0).contains(&selection.confidence));
    }

    #[test]
    fn anti_concentration_rotates_after_three_repeats() {
        let mut config = RlConfig::default();
        config.epsilon_start = 0.0;
        config.epsilon_min = 0.0;
        let selector = ActionSelector::new(config);
        let q = QTable::new(0.3, 0.95);
        // p1 strictly dominates, so pure exploitation would pick it forever.
        q.update((0, 0, 0, 0, 0), "p1".to_string(), 1.0, (0, 0, 0, 0, 0), &[]);
        let candidates = vec![
            candidate("p1", (0, 0, 0, 0, 0), 10.0),
            candidate("p2", (0, 0, 0, 0, 0), 10.0),
        ];

        let mut actions = Vec::new();
        for _ in 0..4 {
            let selection = selector.select("svc", &candidates, &q).unwrap();
            actions.push(selection.action);
        }
        assert_eq!(&actions[0..3], &["p1", "p1", "p1"]);
        assert_eq!(actions[3], "p2");
    }

    #[test]
    fn safe_exploration_filter_excludes_overloaded_candidates_on_explore() {
        let mut config = RlConfig::default();
        config.epsilon_start = 1.0;
        config.epsilon_min = 1.0;
        config.epsilon_decay = 1.0;
        let selector = ActionSelector::new(config);
        let q = QTable::new(0.3, 0.95);
        let candidates = vec![
            candidate("overloaded", (0, 0, 0, 0, 0), 99.0),
            candidate("healthy", (0, 0, 0, 0, 0), 10.0),
        ];
        let selection = selector.select("svc", &candidates, &q).unwrap();
        assert_eq!(selection.action, "healthy");
    }
}
