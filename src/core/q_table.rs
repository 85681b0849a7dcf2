//! Q-Table (C6): the tabular policy itself, `(State, Action) -> f64`.
//!
//! Reads and writes go through a `DashMap` so decide/feedback on different
//! services never contend; persistence is bincode-encoded and happens only
//! at startup (restore) and shutdown (snapshot), never on the request path.

use crate::core::types::{Action, State};
use crate::utils::error::Result;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk shape of a Q-table snapshot. A flat vector round-trips through
/// `DashMap` cleanly and keeps the format stable regardless of `DashMap`'s
/// internal sharding.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    entries: Vec<(State, Action, f64)>,
}

pub struct QTable {
    table: DashMap<(State, Action), f64>,
    learning_rate: f64,
    discount_factor: f64,
}

impl QTable {
    pub fn new(learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            table: DashMap::new(),
            learning_rate,
            discount_factor,
        }
    }

    pub fn get(&self, state: &State, action: &Action) -> f64 {
        self.table
            .get(&(*state, action.clone()))
            .map(|v| *v)
            .unwrap_or(0.0)
    }

    /// `Q(s,a) <- Q(s,a) + alpha * (r + gamma * max_a' Q(s',a') - Q(s,a))`.
    ///
    /// `legal_next_actions` is the set of instances healthy for this service
    /// at feedback time; an empty set (the service just lost all its
    /// instances) treats the bootstrap term as 0 rather than panicking on an
    /// empty max.
    pub fn update(
        &self,
        state: State,
        action: Action,
        reward: f64,
        next_state: State,
        legal_next_actions: &[Action],
    ) -> f64 {
        let max_next = legal_next_actions
            .iter()
            .map(|a| self.get(&next_state, a))
            .fold(f64::NEG_INFINITY, f64::max);
        let max_next = if max_next.is_finite() { max_next } else { 0.0 };

        let old = self.get(&state, &action);
        let target = reward + self.discount_factor * max_next;
        let updated = old + self.learning_rate * (target - old);

        self.table.insert((state, action), updated);
        updated
    }

    /// The highest-valued legal action for `state`, or `None` if `actions`
    /// is empty.
    pub fn best_action(&self, state: &State, actions: &[Action]) -> Option<(Action, f64)> {
        actions
            .iter()
            .map(|a| (a.clone(), self.get(state, a)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn to_snapshot(&self) -> Snapshot {
        let entries = self
            .table
            .iter()
            .map(|e| (e.key().0, e.key().1.clone(), *e.value()))
            .collect();
        Snapshot { entries }
    }

    fn restore_from(&self, snapshot: Snapshot) {
        self.table.clear();
        for (state, action, value) in snapshot.entries {
            self.table.insert((state, action), value);
        }
    }

    /// Loads a snapshot file if `path` is configured and exists, starting
    /// empty otherwise.
    pub async fn load_or_new(
        path: Option<&str>,
        learning_rate: f64,
        discount_factor: f64,
    ) -> Self {
        let table = Self::new(learning_rate, discount_factor);
        if let Some(path) = path {
            if Path::new(path).exists() {
                match table.restore_file(path).await {
                    Ok(()) => tracing::info!("q-table restored from {}", path),
                    Err(e) => tracing::warn!("failed to restore q-table from {}: {}", path, e),
                }
            }
        }
        table
    }

    async fn restore_file(&self, path: &str) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let snapshot: Snapshot = bincode::deserialize(&bytes)?;
        self.restore_from(snapshot);
        Ok(())
    }

    /// Writes the current table to `path`, overwriting any existing file.
    /// Called on graceful shutdown; never on the request path.
    pub async fn save(&self, path: &str) -> Result<()> {
        let snapshot = self.to_snapshot();
        let bytes = bincode::serialize(&snapshot)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_pair_defaults_to_zero() {
        let table = QTable::new(0.3, 0.95);
        assert_eq!(table.get(&(0, 0, 0, 0, 0), &"p1".to_string()), 0.0);
    }

    #[test]
    fn update_moves_value_toward_target() {
        let table = QTable::new(0.5, 0.9);
        let s = (0, 0, 0, 0, 0);
        let next = (1, 0, 0, 0, 0);
        let updated = table.update(s, "p1".to_string(), 1.0, next, &[]);
        // target = 1.0 + 0.9*0 = 1.0; old = 0.0 -> new = 0.0 + 0.5*(1.0-0.0) = 0.5
        assert!((updated - 0.5).abs() < 1e-9);
        assert!((table.get(&s, &"p1".to_string()) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn update_bootstraps_from_best_next_action() {
        let table = QTable::new(1.0, 1.0);
        let s0 = (0, 0, 0, 0, 0);
        let s1 = (1, 0, 0, 0, 0);
        table.update(s1, "p2".to_string(), 10.0, (2, 0, 0, 0, 0), &[]);
        let updated = table.update(s0, "p1".to_string(), 0.0, s1, &["p2".to_string()]);
        assert!((updated - 10.0).abs() < 1e-9);
    }

    #[test]
    fn best_action_picks_the_max() {
        let table = QTable::new(0.5, 0.9);
        let s = (0, 0, 0, 0, 0);
        table.update(s, "low".to_string(), -1.0, s, &[]);
        table.update(s, "high".to_string(), 1.0, s, &[]);
        let (action, _) = table
            .best_action(&s, &["low".to_string(), "high".to_string()])
            .unwrap();
        assert_eq!(action, "high");
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_a_file() {
        let table = QTable::new(0.3, 0.95);
        table.update((0, 0, 0, 0, 0), "p1".to_string(), 1.0, (1, 0, 0, 0, 0), &[]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q_table.bin");
        let path_str = path.to_str().unwrap();
        table.save(path_str).await.unwrap();

        let restored = QTable::load_or_new(Some(path_str), 0.3, 0.95).await;
        assert_eq!(restored.len(), table.len());
        assert_eq!(
            restored.get(&(0, 0, 0, 0, 0), &"p1".to_string()),
            table.get(&(0, 0, 0, 0, 0), &"p1".to_string())
        );
    }

    #[tokio::test]
    async fn missing_snapshot_path_starts_empty() {
        let table = QTable::load_or_new(None, 0.3, 0.95).await;
        assert!(table.is_empty());
    }
}
