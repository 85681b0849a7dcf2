//! Error types for the routing proxy

use thiserror::Error;

/// Result type alias for the proxy
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the proxy
#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Redis errors (registry backing store)
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// HTTP client errors (upstream forwarding, PromQL, health probes)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Q-table snapshot (de)serialization errors
    #[error("Snapshot codec error: {0}")]
    Snapshot(#[from] Box<bincode::ErrorKind>),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Circuit breaker open
    #[error("Circuit breaker open: {0}")]
    CircuitBreaker(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request errors
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),

    /// No registered instances for a service
    #[error("No instances available for service: {0}")]
    NoInstances(String),

    /// The metrics view has no fresh data for a service (breaker open or stale)
    #[error("Metrics unavailable for service: {0}")]
    MetricsUnavailable(String),

    /// Upstream request returned an error status or connection failure
    #[error("Upstream error: {0}")]
    UpstreamError(String),

    /// Upstream request exceeded its deadline
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Decision computation exceeded its budget
    #[error("Decision timeout: {0}")]
    DecisionTimeout(String),

    /// Registry snapshot considered stale (no successful poll within the staleness window)
    #[error("Registry stale: {0}")]
    RegistryStale(String),
}
