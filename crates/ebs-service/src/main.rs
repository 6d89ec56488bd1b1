//! Extension Backend Service
//!
//! Entry point for the animal-facts extension backend. Validates inbound
//! broadcaster tokens and talks to the remote per-channel configuration
//! store with signed, rate-limit-aware requests.

mod auth;
mod config;
mod errors;
mod handlers;
mod middleware;
mod models;
mod observability;
mod routes;
mod services;

use auth::TokenCodec;
use config::Config;
use routes::AppState;
use services::{ConfigStoreClient, FactsService};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ebs_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting extension backend");

    // Install the metrics recorder before anything records
    let metrics_handle = routes::init_metrics_recorder().map_err(|e| {
        error!("Failed to install metrics recorder: {}", e);
        e
    })?;

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        config_api_base_url = %config.config_api_base_url,
        rate_limit_max_retries = config.rate_limit_max_retries,
        "Configuration loaded successfully"
    );

    // A missing or malformed signing secret is a startup-invariant
    // violation: refuse to serve traffic.
    let codec = Arc::new(
        TokenCodec::from_base64_secret(&config.secret, config.owner_user_id.clone()).map_err(
            |e| {
                error!("Failed to build token codec: {}", e);
                e
            },
        )?,
    );

    let config_store = ConfigStoreClient::new(
        config.config_api_base_url.clone(),
        config.client_id.clone(),
        Arc::clone(&codec),
        config.rate_limit_max_retries,
        Duration::from_secs(config.rate_limit_max_wait_seconds),
    )
    .map_err(|e| {
        error!("Failed to build configuration store client: {}", e);
        e
    })?;

    let facts = FactsService::new();

    // Seed a default fact for all channels. Best effort: the store is not a
    // hard startup dependency.
    if let Err(e) = config_store.set_global_segment(facts.default_fact()).await {
        warn!(error = %e, "Failed to seed global segment at startup");
    }

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    // Create application state
    let state = Arc::new(AppState {
        config,
        codec,
        config_store,
        facts,
    });

    // Build application routes
    let app = routes::build_routes(state, metrics_handle);

    // Parse bind address
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Extension backend listening on {}", addr);

    // Start server with graceful shutdown support
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Extension backend shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
