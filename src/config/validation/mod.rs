//! Configuration validation
//!
//! This module provides validation logic for all configuration structures.
//!
//! The validation is organized into several submodules:
//! - `ssrf`: SSRF protection utilities for URL validation
//! - `trait_def`: Core Validate trait definition
//! - `config_validators`: GatewayConfig / ServerConfig validators
//! - `router_validators`: Registry / metrics view / RL / switchboard / health prober validators
//! - `monitoring_validators`: Monitoring configuration validators
//! - `tests`: Test suite for all validators

mod config_validators;
mod monitoring_validators;
mod router_validators;
mod ssrf;
#[cfg(test)]
mod tests;
mod trait_def;

// Re-export the Validate trait for backward compatibility
pub use trait_def::Validate;

// Re-export SSRF validation function if needed externally
pub use ssrf::validate_url_against_ssrf;
