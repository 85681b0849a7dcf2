//! Error recovery utilities: circuit breaker and retry policy.

mod circuit_breaker;
mod retry;
mod types;

// Re-export all public types and structs for backward compatibility
pub use circuit_breaker::CircuitBreaker;
pub use retry::RetryPolicy;
pub use types::{CircuitBreakerConfig, CircuitBreakerMetrics, CircuitState, RetryConfig};

// Include tests module
#[cfg(test)]
mod tests;
