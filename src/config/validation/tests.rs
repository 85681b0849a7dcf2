//! Tests for configuration validation
//!
//! This module contains all tests for the validation logic.

#[cfg(test)]
mod tests {
    use super::super::ssrf::validate_url_against_ssrf;
    use super::super::trait_def::Validate;
    use crate::config::models::*;

    #[test]
    fn test_server_config_validation() {
        let mut config = ServerConfig::default();
        assert!(Validate::validate(&config).is_ok());

        config.port = 0;
        assert!(Validate::validate(&config).is_err());

        config.port = 8080;
        config.host = "".to_string();
        assert!(Validate::validate(&config).is_err());
    }

    #[test]
    fn test_registry_config_validation() {
        let mut config = RegistryConfig::default();
        assert!(Validate::validate(&config).is_ok());

        config.redis_url = "not-a-redis-url".to_string();
        assert!(Validate::validate(&config).is_err());

        config.redis_url = "redis://localhost:6379".to_string();
        config.poll_ms = 0;
        assert!(Validate::validate(&config).is_err());
    }

    #[test]
    fn test_metrics_view_config_validation() {
        let mut config = MetricsViewConfig::default();
        assert!(Validate::validate(&config).is_ok());

        config.prometheus_base_url = "http://localhost:9090".to_string();
        assert!(Validate::validate(&config).is_err(), "loopback base URL should fail SSRF checks");

        config.prometheus_base_url = "http://prometheus.internal-dns.example:9090".to_string();
        config.cb_failure_threshold = 0;
        assert!(Validate::validate(&config).is_err());
    }

    #[test]
    fn test_rl_config_validation() {
        let mut config = RlConfig::default();
        assert!(Validate::validate(&config).is_ok());

        config.learning_rate = 1.5;
        assert!(Validate::validate(&config).is_err());

        config.learning_rate = 0.3;
        config.epsilon_min = 0.9;
        config.epsilon_start = 0.25;
        assert!(Validate::validate(&config).is_err());
    }

    #[test]
    fn test_router_config_validation() {
        let mut config = RouterConfig::default();
        assert!(Validate::validate(&config).is_ok());

        config.default_algorithm = "not-an-algorithm".to_string();
        assert!(Validate::validate(&config).is_err());
    }

    #[test]
    fn test_health_prober_config_validation() {
        let mut config = HealthProbeConfig::default();
        assert!(Validate::validate(&config).is_ok());

        config.probe_timeout_ms = config.probe_ms + 1;
        assert!(Validate::validate(&config).is_err());
    }

    #[test]
    fn test_ssrf_validation_valid_urls() {
        assert!(validate_url_against_ssrf("https://prometheus.example.com/api", "test").is_ok());
        assert!(validate_url_against_ssrf("http://example.com:9090/api", "test").is_ok());
    }

    #[test]
    fn test_ssrf_validation_localhost() {
        assert!(validate_url_against_ssrf("http://localhost/api", "test").is_err());
        assert!(validate_url_against_ssrf("http://localhost:8080/api", "test").is_err());
        assert!(validate_url_against_ssrf("http://LOCALHOST/api", "test").is_err());
    }

    #[test]
    fn test_ssrf_validation_loopback() {
        assert!(validate_url_against_ssrf("http://127.0.0.1/api", "test").is_err());
        assert!(validate_url_against_ssrf("http://127.0.0.1:8080/api", "test").is_err());
        assert!(validate_url_against_ssrf("http://[::1]/api", "test").is_err());
    }

    #[test]
    fn test_ssrf_validation_private_ip() {
        assert!(validate_url_against_ssrf("http://10.0.0.1/api", "test").is_err());
        assert!(validate_url_against_ssrf("http://172.16.0.1/api", "test").is_err());
        assert!(validate_url_against_ssrf("http://192.168.1.1/api", "test").is_err());
    }

    #[test]
    fn test_ssrf_validation_metadata_endpoints() {
        assert!(
            validate_url_against_ssrf("http://169.254.169.254/latest/meta-data", "test").is_err()
        );
        assert!(validate_url_against_ssrf(
            "http://metadata.google.internal/computeMetadata",
            "test"
        )
        .is_err());
    }

    #[test]
    fn test_ssrf_validation_encoded_ip() {
        // 2130706433 = 127.0.0.1
        assert!(validate_url_against_ssrf("http://2130706433/api", "test").is_err());
        // 167772161 = 10.0.0.1
        assert!(validate_url_against_ssrf("http://167772161/api", "test").is_err());
    }

    #[test]
    fn test_ssrf_validation_invalid_scheme() {
        assert!(validate_url_against_ssrf("file:///etc/passwd", "test").is_err());
        assert!(validate_url_against_ssrf("ftp://example.com", "test").is_err());
        assert!(validate_url_against_ssrf("gopher://example.com", "test").is_err());
    }
}
