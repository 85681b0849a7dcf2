//! HTTP response handling for errors

use super::types::GatewayError;
use actix_web::{HttpResponse, ResponseError};

impl ResponseError for GatewayError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            Self::Config(_) | Self::Internal(_) | Self::Io(_) | Self::Snapshot(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Redis(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::HttpClient(_) => StatusCode::BAD_GATEWAY,
            Self::Serialization(_) | Self::Yaml(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::CircuitBreaker(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout(_) | Self::UpstreamTimeout(_) | Self::DecisionTimeout(_) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NoInstances(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::MetricsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::RegistryStale(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let service = match self {
            Self::NoInstances(s)
            | Self::MetricsUnavailable(s)
            | Self::RegistryStale(s)
            | Self::CircuitBreaker(s) => Some(s.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
            service,
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Standard error response body: `{"error": "<kind>", "message": "...", "service": "..."}`
#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}
