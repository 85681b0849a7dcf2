//! Helper functions for creating specific error types

use super::types::GatewayError;

/// Helper functions for creating specific errors
#[allow(dead_code)]
impl GatewayError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    pub fn circuit_breaker<S: Into<String>>(message: S) -> Self {
        Self::CircuitBreaker(message.into())
    }

    pub fn no_instances<S: Into<String>>(service: S) -> Self {
        Self::NoInstances(service.into())
    }

    pub fn metrics_unavailable<S: Into<String>>(service: S) -> Self {
        Self::MetricsUnavailable(service.into())
    }

    pub fn upstream_error<S: Into<String>>(message: S) -> Self {
        Self::UpstreamError(message.into())
    }

    pub fn upstream_timeout<S: Into<String>>(message: S) -> Self {
        Self::UpstreamTimeout(message.into())
    }

    pub fn decision_timeout<S: Into<String>>(message: S) -> Self {
        Self::DecisionTimeout(message.into())
    }

    pub fn registry_stale<S: Into<String>>(message: S) -> Self {
        Self::RegistryStale(message.into())
    }

    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable kind string, used in JSON error bodies.
    ///
    /// The routing-facing variants use their upper-snake literal spelling
    /// since clients match on it; the remaining variants are internal to
    /// this crate and use snake_case.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Redis(_) => "redis_error",
            Self::HttpClient(_) => "http_client_error",
            Self::Serialization(_) => "serialization_error",
            Self::Yaml(_) => "yaml_error",
            Self::Snapshot(_) => "snapshot_error",
            Self::Io(_) => "io_error",
            Self::Validation(_) => "validation_error",
            Self::CircuitBreaker(_) => "circuit_breaker_open",
            Self::Timeout(_) => "timeout",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
            Self::NoInstances(_) => "NO_INSTANCES",
            Self::MetricsUnavailable(_) => "METRICS_UNAVAILABLE",
            Self::UpstreamError(_) => "UPSTREAM_ERROR",
            Self::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            Self::DecisionTimeout(_) => "DECISION_TIMEOUT",
            Self::RegistryStale(_) => "REGISTRY_STALE",
        }
    }
}
