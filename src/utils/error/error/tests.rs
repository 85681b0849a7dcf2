//! Tests for error handling

#[cfg(test)]
mod tests {
    use super::super::types::GatewayError;
    use actix_web::ResponseError;

    #[test]
    fn test_error_creation() {
        let error = GatewayError::bad_request("missing parameter");
        assert!(matches!(error, GatewayError::BadRequest(_)));

        let error = GatewayError::no_instances("checkout");
        assert!(matches!(error, GatewayError::NoInstances(_)));
    }

    #[test]
    fn kind_is_stable_and_machine_readable() {
        assert_eq!(GatewayError::no_instances("checkout").kind(), "NO_INSTANCES");
        assert_eq!(
            GatewayError::metrics_unavailable("checkout").kind(),
            "METRICS_UNAVAILABLE"
        );
    }

    #[test]
    fn no_instances_maps_to_service_unavailable() {
        let error = GatewayError::no_instances("checkout");
        assert_eq!(
            error.status_code(),
            actix_web::http::StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn decision_timeout_maps_to_gateway_timeout() {
        let error = GatewayError::decision_timeout("state encoder exceeded budget");
        assert_eq!(
            error.status_code(),
            actix_web::http::StatusCode::GATEWAY_TIMEOUT
        );
    }
}
