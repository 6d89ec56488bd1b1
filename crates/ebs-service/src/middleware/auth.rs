//! Authentication middleware for protected routes.
//!
//! Extracts the Bearer token from the Authorization header, verifies it with
//! the shared-secret codec, and injects the verified channel id into request
//! extensions. A token without the broadcaster role never reaches the
//! downstream handler.

use crate::auth::{ChannelId, Role, TokenCodec};
use crate::errors::EbsError;
use crate::observability::metrics::record_auth_outcome;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::IntoResponse;
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Shared token codec.
    pub codec: Arc<TokenCodec>,
}

/// Authentication middleware that validates inbound identity tokens.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Response
///
/// - 401 Unauthorized if the token is missing, malformed, expired, or carries
///   a bad signature; a missing header short-circuits before any parsing
/// - 403 Forbidden if the token is valid but the role is not `broadcaster`;
///   the request is NOT forwarded downstream
/// - Otherwise continues to the next handler with the channel id attached
#[instrument(skip(state, req, next), name = "ebs.middleware.auth")]
pub async fn require_broadcaster(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, EbsError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "ebs.middleware.auth", "Missing Authorization header");
            record_auth_outcome("missing");
            EbsError::InvalidToken("Missing Authorization header".to_string())
        })?;

    // Extract Bearer token
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::debug!(target: "ebs.middleware.auth", "Invalid Authorization header format");
        record_auth_outcome("malformed");
        EbsError::InvalidToken("Invalid Authorization header format".to_string())
    })?;

    // Verify the token
    let claims = state.codec.verify(token).map_err(|e| {
        record_auth_outcome("invalid");
        e
    })?;

    // Only the channel owner may request new facts for the channel.
    if claims.role != Role::Broadcaster {
        tracing::debug!(target: "ebs.middleware.auth", role = ?claims.role, "Token role is not broadcaster");
        record_auth_outcome("forbidden");
        return Err(EbsError::Forbidden("Broadcaster role required".to_string()));
    }

    // Store the verified channel id in request extensions for handlers.
    if let Some(channel_id) = claims.channel_id.as_deref().filter(|id| !id.is_empty()) {
        req.extensions_mut().insert(ChannelId::new(channel_id));
    }

    record_auth_outcome("validated");

    // Continue to next handler
    Ok(next.run(req).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    // Full middleware behavior (status codes, short-circuiting, channel id
    // propagation) is covered by the integration tests in tests/auth_tests.rs.

    use super::*;

    #[test]
    fn test_auth_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AuthState>();
    }
}
