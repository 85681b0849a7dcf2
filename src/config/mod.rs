//! Configuration management for the proxy
//!
//! This module handles loading, validation, and management of all proxy
//! configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{GatewayError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the proxy.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Gateway configuration
    pub gateway: GatewayConfig,
}

#[allow(dead_code)]
impl Config {
    /// Load configuration from a YAML file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        let gateway: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;

        let config = Self { gateway };
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables (all defaults; callers
    /// are expected to layer `GATEWAY_*` env overrides on top via the
    /// `envy`-style merge in `ServerConfig`/`RegistryConfig`, etc., when
    /// those are actually read from the process environment).
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let gateway = GatewayConfig::from_env()?;
        let config = Self { gateway };

        config.validate()?;
        Ok(config)
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.gateway.server
    }

    /// Get registry view configuration (C1)
    pub fn registry(&self) -> &RegistryConfig {
        &self.gateway.registry
    }

    /// Get metrics view configuration (C2)
    pub fn metrics_view(&self) -> &MetricsViewConfig {
        &self.gateway.metrics_view
    }

    /// Get routing policy engine configuration (C3-C6)
    pub fn rl(&self) -> &RlConfig {
        &self.gateway.rl
    }

    /// Get switchboard + dispatcher configuration (C8, C9)
    pub fn router(&self) -> &RouterConfig {
        &self.gateway.router
    }

    /// Get health prober configuration (C10)
    pub fn health_prober(&self) -> &HealthProbeConfig {
        &self.gateway.health_prober
    }

    /// Get monitoring configuration
    pub fn monitoring(&self) -> &MonitoringConfig {
        &self.gateway.monitoring
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.gateway
            .validate()
            .map_err(|e| GatewayError::Config(format!("Gateway config error: {}", e)))?;

        self.gateway
            .server
            .validate()
            .map_err(|e| GatewayError::Config(format!("Server config error: {}", e)))?;

        self.gateway
            .server
            .cors
            .validate()
            .map_err(|e| GatewayError::Config(format!("CORS config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.gateway = self.gateway.merge(other.gateway);
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.gateway)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config to JSON: {}", e)))
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.gateway)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_from_file() {
        let config_content = r#"
server:
  host: "127.0.0.1"
  port: 8080
  workers: 4

registry:
  redis_url: "redis://localhost:6379"
  poll_ms: 15000

metrics_view:
  prometheus_base_url: "http://localhost:9090"

rl:
  learning_rate: 0.3
  discount_factor: 0.95

router:
  default_algorithm: "round-robin"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.server().host, "127.0.0.1");
        assert_eq!(config.server().port, 8080);
        assert_eq!(config.registry().redis_url, "redis://localhost:6379");
        assert_eq!(config.rl().learning_rate, 0.3);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();

        let json = config.to_json().unwrap();
        assert!(!json.is_empty());

        let yaml = config.to_yaml().unwrap();
        assert!(!yaml.is_empty());
    }
}
