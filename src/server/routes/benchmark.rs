//! Online A/B benchmark control surface: `POST /benchmark/{start,stop,switch,reset}`,
//! `GET /benchmark/{status,results}`.
//!
//! All of these delegate to the switchboard's `BenchmarkAccumulator` (C9);
//! the actual outcome recording happens in the proxy route as each request
//! completes.

use crate::core::switchboard::BenchmarkState;
use crate::core::types::Algorithm;
use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/benchmark")
            .route("/start", web::post().to(start))
            .route("/stop", web::post().to(stop))
            .route("/switch", web::post().to(switch))
            .route("/reset", web::post().to(reset))
            .route("/status", web::get().to(status))
            .route("/results", web::get().to(results)),
    );
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlgorithmBody {
    algorithm: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartBody {
    duration_minutes: Option<f64>,
    start_algorithm: Option<String>,
}

fn parse_algorithm(raw: &str) -> Result<Algorithm, GatewayError> {
    Algorithm::from_str(raw).map_err(GatewayError::bad_request)
}

/// Resets all counters to a clean slate, optionally switches to
/// `startAlgorithm`, and starts accumulating. `durationMinutes`, if given,
/// is advisory only: `/benchmark/status` reports whether it has elapsed,
/// but the run only actually freezes on an explicit `/benchmark/stop`.
async fn start(
    state: web::Data<AppState>,
    body: Option<web::Json<StartBody>>,
) -> Result<HttpResponse, GatewayError> {
    let body = body.map(web::Json::into_inner).unwrap_or_default();
    let algorithm = body.start_algorithm.as_deref().map(parse_algorithm).transpose()?;
    if let Some(algorithm) = algorithm {
        state.switchboard.set_algorithm(algorithm);
    }
    let duration = body.duration_minutes.map(|m| Duration::from_secs_f64(m.max(0.0) * 60.0));
    state.switchboard.benchmark().reset();
    state.switchboard.benchmark().start(duration);
    Ok(HttpResponse::Ok().json(StatusResponse::from(state.switchboard.as_ref())))
}

async fn stop(state: web::Data<AppState>) -> HttpResponse {
    state.switchboard.benchmark().stop();
    HttpResponse::Ok().json(StatusResponse::from(state.switchboard.as_ref()))
}

/// Switches the algorithm the switchboard dispatches with, leaving an
/// in-progress benchmark run's accumulated stats untouched.
async fn switch(
    state: web::Data<AppState>,
    body: web::Json<AlgorithmBody>,
) -> Result<HttpResponse, GatewayError> {
    let raw = body
        .algorithm
        .as_deref()
        .ok_or_else(|| GatewayError::bad_request("algorithm is required"))?;
    let algorithm = parse_algorithm(raw)?;
    state.switchboard.set_algorithm(algorithm);
    Ok(HttpResponse::Ok().json(StatusResponse::from(state.switchboard.as_ref())))
}

/// Zeroes counters for one algorithm, or all three if `algorithm` is absent.
/// Legal while the benchmark is running: it does not touch `state`.
async fn reset(
    state: web::Data<AppState>,
    body: Option<web::Json<AlgorithmBody>>,
) -> Result<HttpResponse, GatewayError> {
    let algorithm = body
        .and_then(|b| b.into_inner().algorithm)
        .map(|raw| parse_algorithm(&raw))
        .transpose()?;
    state.switchboard.benchmark().reset_counters(algorithm);
    Ok(HttpResponse::Ok().json(StatusResponse::from(state.switchboard.as_ref())))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    state: BenchmarkState,
    algorithm: &'static str,
    elapsed_ms: Option<u128>,
    duration_elapsed: bool,
}

impl From<&crate::core::switchboard::Switchboard> for StatusResponse {
    fn from(switchboard: &crate::core::switchboard::Switchboard) -> Self {
        Self {
            state: switchboard.benchmark().status(),
            algorithm: switchboard.current_algorithm().as_str(),
            elapsed_ms: switchboard.benchmark().elapsed().map(|d| d.as_millis()),
            duration_elapsed: switchboard.benchmark().is_past_duration(),
        }
    }
}

async fn status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(StatusResponse::from(state.switchboard.as_ref()))
}

async fn results(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.switchboard.benchmark().results())
}
