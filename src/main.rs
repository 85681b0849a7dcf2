//! rl-routing-proxy - adaptive Q-learning HTTP reverse proxy
//!
//! Routes proxied traffic to backend instances using a tabular
//! reinforcement-learning policy, falling back to round-robin or
//! least-connections when the policy declines a low-confidence choice.

#![allow(missing_docs)]

use rl_routing_proxy::server;
use rl_routing_proxy::utils::logging::init_tracing;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    // Start server (auto-loads config/gateway.yaml)
    match server::builder::run_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
