//! Path classification helpers shared by routing and request logging.

/// Is this the catch-all proxy path, `/api/{service}/...`?
pub fn is_proxy_route(path: &str) -> bool {
    path.starts_with("/api/")
}

/// Extract the service name from a proxy path, e.g. `/api/orders/v1/foo` ->
/// `Some("orders")`.
pub fn proxy_service_name(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/api/")?;
    let service = rest.split('/').next()?;
    if service.is_empty() {
        None
    } else {
        Some(service)
    }
}

/// Is this one of the benchmark control/reporting routes?
pub fn is_benchmark_route(path: &str) -> bool {
    path.starts_with("/benchmark/")
}

/// Is this a liveness/readiness or built-in metrics route, excluded from
/// benchmark accounting per the router's `benchmark_excluded_prefixes`?
pub fn is_actuator_route(path: &str, excluded_prefixes: &[String]) -> bool {
    excluded_prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_proxy_routes() {
        assert!(is_proxy_route("/api/orders/v1/foo"));
        assert!(!is_proxy_route("/health"));
    }

    #[test]
    fn extracts_service_name() {
        assert_eq!(proxy_service_name("/api/orders/v1/foo"), Some("orders"));
        assert_eq!(proxy_service_name("/api/"), None);
        assert_eq!(proxy_service_name("/health"), None);
    }

    #[test]
    fn recognizes_benchmark_routes() {
        assert!(is_benchmark_route("/benchmark/start"));
        assert!(!is_benchmark_route("/stats"));
    }

    #[test]
    fn recognizes_actuator_routes() {
        let prefixes = vec!["/actuator".to_string(), "/health".to_string()];
        assert!(is_actuator_route("/actuator/health", &prefixes));
        assert!(is_actuator_route("/health", &prefixes));
        assert!(!is_actuator_route("/api/orders/foo", &prefixes));
    }
}
