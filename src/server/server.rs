//! HTTP server core implementation
//!
//! This module provides the HttpServer struct and its core methods. `new`
//! wires the routing core (C1-C10) into an `AppState` and spawns its
//! background workers; `start` binds and serves.

use crate::config::{Config, ServerConfig};
use crate::core::decision::{DecisionService, FeedbackInput};
use crate::core::dispatcher::Dispatcher;
use crate::core::health_prober::HealthProber;
use crate::core::metrics_view::MetricsView;
use crate::core::q_table::QTable;
use crate::core::registry::RegistryView;
use crate::core::switchboard::Switchboard;
use crate::core::types::Algorithm;
use crate::server::middleware::{MetricsMiddleware, RequestIdMiddleware};
use crate::server::routes;
use crate::server::state::AppState;
use crate::storage::RedisRegistryStore;
use crate::utils::error::recovery::{RetryConfig, RetryPolicy};
use crate::utils::error::{GatewayError, Result};
use actix_cors::Cors;
use actix_web::{
    App, HttpServer as ActixHttpServer,
    middleware::Logger,
    web,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Background tasks the server owns for its lifetime: the registry poller,
/// the health prober loop and the feedback-queue consumer. Aborted on
/// graceful shutdown; none of them hold state worth draining except the
/// Q-table, which is snapshotted separately.
struct Workers {
    registry_poller: JoinHandle<()>,
    health_prober: JoinHandle<()>,
    feedback_consumer: JoinHandle<()>,
}

impl Workers {
    fn abort_all(&self) {
        self.registry_poller.abort();
        self.health_prober.abort();
        self.feedback_consumer.abort();
    }
}

/// HTTP server
#[allow(dead_code)]
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
    workers: Workers,
}

#[allow(dead_code)]
impl HttpServer {
    /// Create a new HTTP server
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let store =
            RedisRegistryStore::connect(&config.registry().redis_url, &config.registry().key_prefix).await?;
        let registry = Arc::new(RegistryView::new(store, config.registry().clone()));
        // Block on the first poll so the server doesn't start serving
        // against a snapshot that's never been populated.
        registry.refresh().await;

        let metrics_view = Arc::new(MetricsView::new(config.metrics_view().clone()));
        let prober = Arc::new(HealthProber::new(config.health_prober().clone()));
        let q_table = Arc::new(
            QTable::load_or_new(
                config.rl().q_table_snapshot_path.as_deref(),
                config.rl().learning_rate,
                config.rl().discount_factor,
            )
            .await,
        );
        let decision = Arc::new(DecisionService::new(
            registry.clone(),
            metrics_view.clone(),
            prober.clone(),
            q_table.clone(),
            config.rl(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            config.router().upstream_timeout_ms,
            config.router().feedback_queue_capacity,
        ));
        let default_algorithm = Algorithm::from_str(&config.router().default_algorithm).unwrap_or_else(|e| {
            warn!("{}, defaulting to round-robin", e);
            Algorithm::RoundRobin
        });
        let switchboard = Arc::new(Switchboard::new(default_algorithm, dispatcher.connections.clone()));

        let registry_poller = registry.clone().spawn_poller();
        let health_prober = prober.clone().spawn(registry.clone());
        let feedback_consumer = spawn_feedback_consumer(dispatcher.clone(), decision.clone());

        let state = AppState::new(
            Arc::new(config.clone()),
            registry,
            metrics_view,
            prober,
            q_table,
            decision,
            dispatcher,
            switchboard,
        );

        Ok(Self {
            config: config.server().clone(),
            state,
            workers: Workers {
                registry_poller,
                health_prober,
                feedback_consumer,
            },
        })
    }

    /// Create the Actix-web application
    fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        info!("Setting up routes and middleware");

        let cors_config = &state.config.server().cors;
        let mut cors = Cors::default();

        if cors_config.enabled {
            if cors_config.allows_all_origins() {
                cors = cors.allow_any_origin();
                cors_config.validate().unwrap_or_else(|e| {
                    warn!(error = %e, "CORS Configuration Warning");
                });
            } else {
                for origin in &cors_config.allowed_origins {
                    cors = cors.allowed_origin(origin);
                }
            }

            let methods: Vec<actix_web::http::Method> = cors_config
                .allowed_methods
                .iter()
                .filter_map(|m| m.parse().ok())
                .collect();
            if !methods.is_empty() {
                cors = cors.allowed_methods(methods);
            }

            let headers: Vec<actix_web::http::header::HeaderName> = cors_config
                .allowed_headers
                .iter()
                .filter_map(|h| h.parse().ok())
                .collect();
            if !headers.is_empty() {
                cors = cors.allowed_headers(headers);
            }

            cors = cors.max_age(cors_config.max_age as usize);

            if cors_config.allow_credentials {
                cors = cors.supports_credentials();
            }
        }

        App::new()
            .app_data(state)
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .wrap(MetricsMiddleware)
            .configure(routes::decision::configure_routes)
            .configure(routes::benchmark::configure_routes)
            .configure(routes::proxy::configure_routes)
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();
        let port = self.config.port;
        let worker_count = self.config.worker_count();
        let workers = self.workers;

        info!("Starting HTTP server on {}", bind_addr);

        let q_table = self.state.q_table.clone();
        let snapshot_path = self.state.config.rl().q_table_snapshot_path.clone();
        let state = web::Data::new(self.state);

        let server = ActixHttpServer::new(move || Self::create_app(state.clone()))
            .workers(worker_count)
            .bind(&bind_addr)
            .map_err(|e| Self::format_bind_error(e, &bind_addr, port))?
            .run();

        info!("HTTP server listening on {}", bind_addr);
        info!("  GET  /health          - decision service health (C7)");
        info!("  GET  /stats           - Q-table and epsilon stats (C7)");
        info!("  POST /decide          - pick an instance for a service (C7)");
        info!("  POST /feedback        - report a decision's outcome (C7)");
        info!("  *    /benchmark/*     - online A/B benchmark control (C9)");
        info!("  *    /api/{{service}}/* - proxied traffic (C8, C9)");

        let handle = server.handle();
        tokio::spawn(async move {
            Self::shutdown_signal().await;
            info!("shutdown signal received, stopping background workers");
            workers.abort_all();
            if let Some(path) = snapshot_path.as_deref() {
                match q_table.save(path).await {
                    Ok(()) => info!("q-table snapshot written to {}", path),
                    Err(e) => warn!("failed to snapshot q-table to {}: {}", path, e),
                }
            }
            handle.stop(true).await;
        });

        server
            .await
            .map_err(|e| GatewayError::server(format!("Server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Drains the dispatcher's feedback queue into the decision service's
/// `/feedback` step. Runs off the request path so the post-state metrics
/// fetch never delays a response already sent downstream.
///
/// A failed feedback application retries once with a 10ms backoff, then is
/// dropped — the source system's delivery is best-effort with no retry at
/// all; this is the one retry this spec allows on top of that (§7).
fn spawn_feedback_consumer(dispatcher: Arc<Dispatcher>, decision: Arc<DecisionService>) -> JoinHandle<()> {
    let retry = RetryPolicy::new(RetryConfig {
        max_attempts: 2,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(10),
        backoff_multiplier: 1.0,
        jitter: false,
    });
    tokio::spawn(async move {
        info!("feedback consumer starting");
        loop {
            let job = dispatcher.feedback.pop().await;
            let input = FeedbackInput {
                service_name: job.service_name,
                selected_pod: job.selected_pod,
                response_time_ms: job.response_time_ms,
                status_code: job.status_code,
                error_occurred: job.error_occurred,
            };
            let result = retry
                .call(|| decision.feedback(input.clone()))
                .await;
            if let Err(e) = result {
                warn!("feedback application dropped after retry: {}", e);
            }
        }
    })
}
