//! Decision service HTTP surface: `POST /decide`, `POST /feedback`,
//! `GET /health`, `GET /stats`.
//!
//! Every handler here is a thin wrapper around `DecisionService` (C7) —
//! `GatewayError` already implements `actix_web::ResponseError`, so handlers
//! just `?`-propagate it and the right status code and JSON error body fall
//! out automatically.

use crate::core::decision::FeedbackInput;
use crate::server::state::AppState;
use crate::utils::error::Result;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/decide", web::post().to(decide))
        .route("/feedback", web::post().to(feedback))
        .route("/health", web::get().to(health))
        .route("/stats", web::get().to(stats));
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecideRequest {
    service_name: String,
    /// Accepted for forward compatibility with clients that want the
    /// decision contextualized by the request path; the policy itself is
    /// keyed on service + instance metrics, not on path.
    #[serde(default)]
    #[allow(dead_code)]
    request_path: Option<String>,
}

async fn decide(state: web::Data<AppState>, body: web::Json<DecideRequest>) -> Result<HttpResponse> {
    let response = state.decision.decide(&body.service_name).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackRequest {
    service_name: String,
    selected_pod: String,
    response_time_ms: f64,
    status_code: u16,
    error_occurred: bool,
}

impl From<FeedbackRequest> for FeedbackInput {
    fn from(r: FeedbackRequest) -> Self {
        FeedbackInput {
            service_name: r.service_name,
            selected_pod: r.selected_pod,
            response_time_ms: r.response_time_ms,
            status_code: r.status_code,
            error_occurred: r.error_occurred,
        }
    }
}

async fn feedback(state: web::Data<AppState>, body: web::Json<FeedbackRequest>) -> Result<HttpResponse> {
    state.decision.feedback(body.into_inner().into()).await?;
    Ok(HttpResponse::Ok().finish())
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.decision.health())
}

async fn stats(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.decision.stats())
}
