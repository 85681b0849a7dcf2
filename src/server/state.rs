//! Application state shared across HTTP handlers.
//!
//! This module provides the AppState struct and its implementations.

use crate::config::Config;
use crate::core::decision::DecisionService;
use crate::core::dispatcher::Dispatcher;
use crate::core::health_prober::HealthProber;
use crate::core::metrics_view::MetricsView;
use crate::core::q_table::QTable;
use crate::core::registry::RegistryView;
use crate::core::switchboard::Switchboard;
use std::sync::Arc;

/// HTTP server state shared across handlers.
///
/// Every field is an `Arc` to a routing-core component so handlers can
/// clone the state cheaply per request without taking any lock of their
/// own; the components themselves own whatever internal synchronization
/// they need.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only).
    pub config: Arc<Config>,
    /// Registry view (C1).
    pub registry: Arc<RegistryView>,
    /// Metrics view (C2).
    pub metrics_view: Arc<MetricsView>,
    /// Health prober (C10).
    pub prober: Arc<HealthProber>,
    /// Tabular Q-table (C6), shared between the decision service and the
    /// snapshot save on shutdown.
    pub q_table: Arc<QTable>,
    /// Decision service (C7): `/decide`, `/feedback`, `/health`, `/stats`.
    pub decision: Arc<DecisionService>,
    /// Proxy dispatcher (C8): forwards proxied requests and queues feedback.
    pub dispatcher: Arc<Dispatcher>,
    /// Algorithm switchboard (C9) plus the online benchmark accumulator.
    pub switchboard: Arc<Switchboard>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        registry: Arc<RegistryView>,
        metrics_view: Arc<MetricsView>,
        prober: Arc<HealthProber>,
        q_table: Arc<QTable>,
        decision: Arc<DecisionService>,
        dispatcher: Arc<Dispatcher>,
        switchboard: Arc<Switchboard>,
    ) -> Self {
        Self {
            config,
            registry,
            metrics_view,
            prober,
            q_table,
            decision,
            dispatcher,
            switchboard,
        }
    }
}
