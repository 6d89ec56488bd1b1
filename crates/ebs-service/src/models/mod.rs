//! Data models for API responses.

use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status, always "healthy" while the process serves traffic.
    pub status: String,
}
