//! Health check handler.

use crate::models::HealthResponse;
use axum::Json;
use tracing::instrument;

/// Health check handler.
///
/// The service holds no local state worth probing; reachability of the remote
/// store is intentionally not part of liveness.
#[instrument(skip_all, name = "ebs.handlers.health")]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
