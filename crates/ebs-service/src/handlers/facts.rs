//! Random fact handler.
//!
//! Handles the broadcaster requesting a new animal fact for their channel:
//! reads the broadcaster segment to learn the configured kind, picks a fact,
//! and publishes it to the channel's developer segment.

use crate::auth::ChannelId;
use crate::errors::EbsError;
use crate::routes::AppState;
use crate::services::AnimalKind;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /api/randomfact.
///
/// Requires the authentication middleware to have attached a verified
/// [`ChannelId`]; a token verified without a channel id cannot be served.
///
/// ## Response
///
/// 200 with an empty body on success. Remote-store failures propagate as 5xx
/// instead of silently succeeding.
#[instrument(skip_all, name = "ebs.handlers.random_fact")]
pub async fn random_fact(
    State(state): State<Arc<AppState>>,
    channel: Option<Extension<ChannelId>>,
) -> Result<StatusCode, EbsError> {
    let Some(Extension(channel)) = channel else {
        tracing::warn!(target: "ebs.handlers.facts", "Channel id missing from request context");
        return Err(EbsError::InvalidToken(
            "Channel id missing from request context".to_string(),
        ));
    };

    let configured = state
        .config_store
        .get_broadcaster_segment(channel.as_str())
        .await?;

    // Channels that never configured a kind get the default fact.
    let fact = match configured.parse::<AnimalKind>() {
        Ok(kind) => state.facts.random_fact(kind),
        Err(_) => state.facts.default_fact(),
    };

    tracing::debug!(
        target: "ebs.handlers.facts",
        channel_id = %channel,
        "Publishing new fact to developer segment"
    );

    state
        .config_store
        .set_developer_segment(channel.as_str(), fact)
        .await?;

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    // The handler is exercised end-to-end (auth, store reads and writes,
    // error propagation) in tests/randomfact_tests.rs.
}
