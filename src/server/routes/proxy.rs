//! Proxy Dispatcher HTTP surface (C8+C9): the catch-all `/api/{service}/...`
//! route that resolves a registry service name, picks an instance via
//! whichever algorithm the switchboard currently holds, forwards the
//! request, and records the outcome for both the Q-table (via the feedback
//! queue) and the online benchmark.

use crate::core::decision::healthy_candidates;
use crate::core::dispatcher::{strip_hop_by_hop, FeedbackJob};
use crate::core::types::Algorithm;
use crate::server::handlers::{to_actix_headers, to_reqwest_headers, to_reqwest_method};
use crate::server::middleware::is_actuator_route;
use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use actix_web::{web, HttpRequest, HttpResponse};
use bytes::Bytes;
use std::time::Duration;
use tracing::warn;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/{service}/{tail:.*}", web::route().to(proxy));
}

/// `/api/<serviceName>/...` resolves to the registry/dispatch service name
/// `<serviceName>-service`.
fn registry_service_name(service: &str) -> String {
    format!("{service}-service")
}

async fn proxy(
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GatewayError> {
    let (service, tail) = path.into_inner();
    let service_name = registry_service_name(&service);

    let candidates = healthy_candidates(&state.registry, &state.prober, &service_name);
    if candidates.is_empty() {
        return Err(GatewayError::no_instances(service_name));
    }

    let algorithm = state.switchboard.current_algorithm();
    let (action, served_by) = select_action(&state, &service_name, &candidates, algorithm).await?;

    let instance = candidates
        .iter()
        .find(|i| i.action() == action)
        .ok_or_else(|| GatewayError::internal(format!("selected action {action} vanished from candidate set")))?;

    let mut downstream_path = format!("/{tail}");
    let query = req.query_string();
    if !query.is_empty() {
        downstream_path.push('?');
        downstream_path.push_str(query);
    }

    let method = to_reqwest_method(req.method())
        .ok_or_else(|| GatewayError::bad_request(format!("unsupported method: {}", req.method())))?;
    let headers = to_reqwest_headers(req.headers());

    let forwarded = state
        .dispatcher
        .forward(instance, method, &downstream_path, headers, body)
        .await;

    let is_error = forwarded.as_ref().map(|r| r.status >= 500).unwrap_or(true);
    let elapsed_ms = forwarded
        .as_ref()
        .map(|r| r.elapsed.as_secs_f64() * 1000.0)
        .unwrap_or(0.0);
    let status_code = forwarded.as_ref().map(|r| r.status).unwrap_or(502);

    if !is_actuator_route(&downstream_path, &state.config.router().benchmark_excluded_prefixes) {
        state.switchboard.benchmark().record_outcome(served_by, elapsed_ms, is_error);
    }

    state.dispatcher.emit_feedback(FeedbackJob {
        service_name: service_name.clone(),
        selected_pod: action,
        response_time_ms: elapsed_ms,
        status_code,
        error_occurred: is_error,
    });

    let forwarded = forwarded?;
    let mut builder = HttpResponse::build(
        actix_web::http::StatusCode::from_u16(forwarded.status).unwrap_or(actix_web::http::StatusCode::BAD_GATEWAY),
    );
    for (name, value) in to_actix_headers(&strip_hop_by_hop(&forwarded.headers)) {
        builder.insert_header((name, value));
    }
    Ok(builder.body(forwarded.body))
}

/// Picks an instance for `service_name`. For the two baseline algorithms
/// this is a synchronous switchboard call; for `rl-agent` it calls the
/// decision service under `decision_timeout_ms`, falling back to
/// round-robin on timeout or internal error (the confidence-threshold
/// fallback itself is already handled inside `DecisionService::decide`).
///
/// Returns the chosen action plus the algorithm actually responsible for it,
/// since a timed-out RL decision is attributed to round-robin for benchmark
/// accounting.
async fn select_action(
    state: &AppState,
    service_name: &str,
    candidates: &[crate::core::types::Instance],
    algorithm: Algorithm,
) -> Result<(String, Algorithm), GatewayError> {
    match algorithm {
        Algorithm::RoundRobin | Algorithm::LeastConnections => {
            let action = state
                .switchboard
                .choose_with(service_name, candidates, algorithm)
                .expect("candidates is non-empty");
            Ok((action, algorithm))
        }
        Algorithm::RlAgent => {
            let timeout_ms = state.config.router().decision_timeout_ms;
            match tokio::time::timeout(Duration::from_millis(timeout_ms), state.decision.decide(service_name)).await {
                Ok(Ok(response)) => Ok((response.selected_pod, Algorithm::RlAgent)),
                Ok(Err(e)) => {
                    warn!("decision service error for {}, falling back to round-robin: {}", service_name, e);
                    let action = state
                        .switchboard
                        .choose_with(service_name, candidates, Algorithm::RoundRobin)
                        .expect("candidates is non-empty");
                    Ok((action, Algorithm::RoundRobin))
                }
                Err(_) => {
                    warn!("decision service timed out after {}ms for {}, falling back to round-robin", timeout_ms, service_name);
                    let action = state
                        .switchboard
                        .choose_with(service_name, candidates, Algorithm::RoundRobin)
                        .expect("candidates is non-empty");
                    Ok((action, Algorithm::RoundRobin))
                }
            }
        }
    }
}
