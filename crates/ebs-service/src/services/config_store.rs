//! Client for the remote per-channel configuration store.
//!
//! Every call mints its own short-lived token via [`TokenCodec`] and performs
//! exactly one outbound request (plus at most the transport's bounded
//! rate-limit retries). No caching, no batching: the remote store is the sole
//! source of consistency.
//!
//! # Security
//!
//! - Each request carries a freshly issued bearer token scoped to the target
//!   channel (or to no channel, for global writes)
//! - Timeouts prevent hanging connections
//! - Errors are logged server-side and propagate as typed values

use crate::auth::TokenCodec;
use crate::errors::EbsError;
use crate::observability::metrics::record_upstream_request;
use crate::services::transport::RateLimitedTransport;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Default timeout for a single store request, in seconds.
const UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Default connect timeout, in seconds.
const UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Header naming the extension client on every store request.
pub const CLIENT_ID_HEADER: &str = "Client-Id";

/// Store partition a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Applies to all channels.
    Global,
    /// Per-channel, written by this service.
    Developer,
    /// Per-channel, written by the channel owner; read-only from here.
    Broadcaster,
}

/// PUT body for a segment write.
#[derive(Debug, Clone, Serialize)]
struct SetSegmentRequest<'a> {
    segment: SegmentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_id: Option<&'a str>,
    content: &'a str,
}

/// Segment metadata echoed back in store responses.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentDescriptor {
    pub segment_type: SegmentKind,
    #[serde(default)]
    pub channel_id: String,
}

/// Stored record: version plus opaque content.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurationRecord {
    #[serde(default)]
    pub version: String,
    pub content: String,
}

/// One entry of a channel's configuration listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurationEntry {
    pub segment: SegmentDescriptor,
    pub record: ConfigurationRecord,
}

/// Response map keyed by `"<segment_type>:<channel_id>"`.
pub type ConfigurationResponse = HashMap<String, ConfigurationEntry>;

/// HTTP client for the remote configuration store.
#[derive(Clone)]
pub struct ConfigStoreClient {
    http: reqwest::Client,
    transport: RateLimitedTransport,
    codec: Arc<TokenCodec>,
    client_id: String,
    base_url: String,
}

impl ConfigStoreClient {
    /// Create a new store client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the store API (no trailing slash needed)
    /// * `client_id` - Extension client identifier
    /// * `codec` - Token codec used to sign every outbound request
    /// * `max_retries` / `max_wait` - Rate-limit retry policy for the transport
    ///
    /// # Errors
    ///
    /// Returns `EbsError::Internal` if the HTTP client cannot be built.
    pub fn new(
        base_url: String,
        client_id: String,
        codec: Arc<TokenCodec>,
        max_retries: u32,
        max_wait: Duration,
    ) -> Result<Self, EbsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(UPSTREAM_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(UPSTREAM_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                tracing::error!(target: "ebs.services.config_store", error = %e, "Failed to build HTTP client");
                EbsError::Internal
            })?;

        let transport = RateLimitedTransport::new(http.clone(), max_retries, max_wait);

        Ok(Self {
            http,
            transport,
            codec,
            client_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Write the global segment, visible to all channels.
    ///
    /// The signing token is scoped to no channel.
    #[instrument(skip(self, content), name = "ebs.config_store.set_global")]
    pub async fn set_global_segment(&self, content: &str) -> Result<(), EbsError> {
        self.put_segment(SegmentKind::Global, None, content).await
    }

    /// Write the developer segment for one channel.
    #[instrument(skip(self, content), fields(channel_id = %channel_id), name = "ebs.config_store.set_developer")]
    pub async fn set_developer_segment(
        &self,
        channel_id: &str,
        content: &str,
    ) -> Result<(), EbsError> {
        self.put_segment(SegmentKind::Developer, Some(channel_id), content)
            .await
    }

    /// Read the content the channel owner stored in the broadcaster segment.
    ///
    /// An absent broadcaster entry is a valid state (nothing configured yet)
    /// and yields empty content, not an error.
    #[instrument(skip(self), fields(channel_id = %channel_id), name = "ebs.config_store.get_broadcaster")]
    pub async fn get_broadcaster_segment(&self, channel_id: &str) -> Result<String, EbsError> {
        let token = self.codec.issue(Some(channel_id))?;
        let request = self
            .http
            .get(format!(
                "{}/extensions/{}/configurations/channels/{}",
                self.base_url, self.client_id, channel_id
            ))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .header(CONTENT_TYPE, "application/json")
            .build()
            .map_err(|e| {
                tracing::error!(target: "ebs.services.config_store", error = %e, "Failed to build store request");
                EbsError::Internal
            })?;

        let outcome = self.transport.execute(request).await;
        record_upstream_request(
            "get_segments",
            if outcome.is_ok() { "success" } else { "error" },
        );
        let body = outcome?;

        if body.is_empty() {
            return Ok(String::new());
        }

        let entries: ConfigurationResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(target: "ebs.services.config_store", error = %e, "Undecodable configuration response");
            EbsError::MalformedResponse("undecodable configuration response".to_string())
        })?;

        Ok(broadcaster_content(entries))
    }

    async fn put_segment(
        &self,
        segment: SegmentKind,
        channel_id: Option<&str>,
        content: &str,
    ) -> Result<(), EbsError> {
        let token = self.codec.issue(channel_id)?;
        let body = SetSegmentRequest {
            segment,
            channel_id,
            content,
        };

        let request = self
            .http
            .put(format!(
                "{}/extensions/{}/configurations/",
                self.base_url, self.client_id
            ))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(CLIENT_ID_HEADER, &self.client_id)
            .json(&body)
            .build()
            .map_err(|e| {
                tracing::error!(target: "ebs.services.config_store", error = %e, "Failed to build store request");
                EbsError::Internal
            })?;

        let outcome = self.transport.execute(request).await;
        record_upstream_request(
            "put_segment",
            if outcome.is_ok() { "success" } else { "error" },
        );
        outcome.map(|_| ())
    }
}

/// Content of the single broadcaster entry, or empty when none exists.
fn broadcaster_content(entries: ConfigurationResponse) -> String {
    entries
        .into_values()
        .find(|entry| entry.segment.segment_type == SegmentKind::Broadcaster)
        .map(|entry| entry.record.content)
        .unwrap_or_default()
}
