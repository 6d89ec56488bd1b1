//! Service error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse`
//! impl. Response bodies are the bare status reason phrase; the actual cause
//! is logged server-side so nothing internal leaks to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Extension backend error type.
///
/// Maps to HTTP status codes:
/// - InvalidToken: 401 Unauthorized
/// - Forbidden: 403 Forbidden
/// - RateLimited, UpstreamUnavailable: 503 Service Unavailable
/// - UpstreamStatus, MalformedResponse: 502 Bad Gateway
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum EbsError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration store still rate limited after retrying")]
    RateLimited,

    #[error("Configuration store returned unexpected status {0}")]
    UpstreamStatus(u16),

    #[error("Configuration store unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed configuration store response: {0}")]
    MalformedResponse(String),

    #[error("Internal server error")]
    Internal,
}

impl EbsError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            EbsError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            EbsError::Forbidden(_) => StatusCode::FORBIDDEN,
            EbsError::RateLimited | EbsError::UpstreamUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            EbsError::UpstreamStatus(_) | EbsError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            EbsError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EbsError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log the actual cause server-side; the client only sees the status.
        match &self {
            EbsError::InvalidToken(reason) => {
                tracing::debug!(target: "ebs.errors", reason = %reason, "Rejecting request as unauthorized");
            }
            EbsError::Forbidden(reason) => {
                tracing::debug!(target: "ebs.errors", reason = %reason, "Rejecting request as forbidden");
            }
            EbsError::RateLimited => {
                tracing::warn!(target: "ebs.errors", "Configuration store rate limit outlasted retries");
            }
            EbsError::UpstreamStatus(code) => {
                tracing::warn!(target: "ebs.errors", status = code, "Unexpected configuration store status");
            }
            EbsError::UpstreamUnavailable(reason) => {
                tracing::warn!(target: "ebs.errors", reason = %reason, "Configuration store unavailable");
            }
            EbsError::MalformedResponse(reason) => {
                tracing::warn!(target: "ebs.errors", reason = %reason, "Undecodable configuration store response");
            }
            EbsError::Internal => {
                tracing::error!(target: "ebs.errors", "Internal error surfaced to client");
            }
        }

        let body = status.canonical_reason().unwrap_or("Error");
        let mut response = (status, body).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"extension-api\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
