//! HTTP routes for the extension backend.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenCodec;
use crate::config::Config;
use crate::handlers;
use crate::middleware::auth::{require_broadcaster, AuthState};
use crate::services::{ConfigStoreClient, FactsService};
use axum::http::{header, Method};
use axum::routing::get;
use axum::{middleware, Router};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Upper bound on one inbound request. The worst case is the capped
/// rate-limit wait plus two upstream attempts.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Shared token codec.
    pub codec: Arc<TokenCodec>,

    /// Remote configuration store client.
    pub config_store: ConfigStoreClient,

    /// Local fact lists.
    pub facts: FactsService,
}

/// Install the Prometheus recorder and return its render handle.
///
/// Must be called once per process, before any metric is recorded.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/api/randomfact` - Protected by the broadcaster-token middleware
/// - `/health` - Liveness endpoint
/// - `/metrics` - Prometheus scrape endpoint
/// - CORS allowing the `Authorization` header (the extension frontend runs
///   on a different origin), request tracing, and a request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        codec: Arc::clone(&state.codec),
    });

    // Protected routes: every request passes the token middleware first
    let protected_routes = Router::new()
        .route("/api/randomfact", get(handlers::random_fact))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            require_broadcaster,
        ))
        .with_state(Arc::clone(&state));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::AUTHORIZATION]);

    // Apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. CorsLayer - Answer preflight and tag responses
    protected_routes
        .merge(public_routes)
        .merge(metrics_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}
