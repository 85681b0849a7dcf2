//! Routing core: the ten components (C1-C10) that together decide where
//! each proxied request goes and learn from how it turned out.
//!
//! - `types`: shared data model (instances, metrics, state, actions).
//! - `registry` (C1): eventually-consistent `{service -> [instance]}` view.
//! - `metrics_view` (C2): circuit-broken, cached PromQL telemetry.
//! - `state_encoder` (C3): fixed-width binning into the Q-table's state key.
//! - `reward` (C4): the five-component and simplified reward formulas.
//! - `action_selector` (C5): epsilon-greedy exploration policy.
//! - `q_table` (C6): the tabular policy and its persistence.
//! - `decision` (C7): orchestrates C1/C2/C3/C5/C6 behind decide/feedback.
//! - `dispatcher` (C8): forwards proxied requests, times them, queues
//!   feedback.
//! - `switchboard` (C9): active algorithm + online benchmark accumulator.
//! - `health_prober` (C10): active backend health checks.

pub mod action_selector;
pub mod decision;
pub mod dispatcher;
pub mod health_prober;
pub mod metrics_view;
pub mod q_table;
pub mod registry;
pub mod reward;
pub mod state_encoder;
pub mod switchboard;
pub mod types;
