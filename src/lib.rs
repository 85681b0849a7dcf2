//! # rl-routing-proxy
//!
//! An adaptive HTTP reverse proxy that routes requests to backend instances
//! using a tabular Q-learning policy instead of a fixed load-balancing rule.
//!
//! ## Architecture
//!
//! - **Registry view** (`core::registry`) — an eventually-consistent snapshot
//!   of `{service -> [instance]}` polled from an external Redis-backed store.
//! - **Metrics view** (`core::metrics_view`) — per-instance telemetry pulled
//!   from a PromQL-compatible time-series store, circuit-broken and cached.
//! - **State encoder** (`core::state_encoder`) — bins raw metrics into a
//!   small discrete state.
//! - **Reward function** (`core::reward`) — scores one decision's outcome.
//! - **Action selector** (`core::action_selector`) — epsilon-greedy selection
//!   with safe-exploration filtering and anti-concentration rotation.
//! - **Q-table** (`core::q_table`) — the tabular policy itself, persisted to
//!   disk across restarts.
//! - **Decision service** (`core::decision`) — the `/decide` and `/feedback`
//!   orchestration layer.
//! - **Proxy dispatcher** (`core::dispatcher`) — forwards proxied requests
//!   and queues async feedback.
//! - **Algorithm switchboard** (`core::switchboard`) — holds the active
//!   dispatch algorithm (round-robin, least-connections or the RL agent) and
//!   the online A/B benchmark accumulator.
//! - **Health prober** (`core::health_prober`) — an active liveness check
//!   independent of what the registry producer itself reports.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rl_routing_proxy::{Gateway, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/gateway.yaml").await?;
//!     let gateway = Gateway::new(config).await?;
//!     gateway.run().await?;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use utils::error::{GatewayError, Result};

pub use core::types::{Action, Algorithm, DecisionType, Instance, InstanceMetrics, ServiceView, State};

use tracing::info;

/// A minimal facade over the proxy's HTTP server, for library consumers that
/// want to embed it rather than run `main.rs`'s binary directly.
pub struct Gateway {
    config: Config,
    server: server::HttpServer,
}

impl Gateway {
    /// Create a new gateway instance.
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating new gateway instance");
        let server = server::HttpServer::new(&config).await?;
        Ok(Self { config, server })
    }

    /// Run the gateway server until it's shut down.
    pub async fn run(self) -> Result<()> {
        info!("Starting rl-routing-proxy");
        info!("Configuration: {:#?}", self.config);
        self.server.start().await?;
        Ok(())
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Gateway build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Build
    pub build_time: &'static str,
    /// Git commit hash
    pub git_hash: &'static str,
    /// Rust version
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            build_time: "unknown",
            git_hash: "unknown",
            rust_version: "unknown",
        }
    }
}

/// Build
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}
