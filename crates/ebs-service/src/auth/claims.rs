//! Identity token payload.
//!
//! Contains the claims carried by inbound and outbound tokens. The `user_id`
//! field is redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role claim restricting what the token holder may do.
///
/// Modeled as a closed enum so an unexpected role string fails decoding
/// instead of flowing through as an unchecked value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The channel owner.
    Broadcaster,
    /// A moderator of the channel.
    Moderator,
    /// A viewer of the channel.
    Viewer,
    /// A backend service acting on its own behalf.
    External,
}

/// PubSub permissions embedded in token claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubSubPermissions {
    /// Topics the holder may publish to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send: Option<Vec<String>>,

    /// Topics the holder may subscribe to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen: Option<Vec<String>>,
}

/// Identity token claims.
///
/// Wire shape:
/// `{opaque_user_id?, user_id, channel_id?, role, pubsub_perms:{send?, listen?}, exp}`
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Opaque per-extension user identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opaque_user_id: Option<String>,

    /// Platform user id - redacted in Debug output.
    #[serde(default)]
    pub user_id: String,

    /// Channel the token is scoped to, absent for channel-agnostic tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,

    /// Role of the token holder.
    pub role: Role,

    /// PubSub permissions granted to this token.
    #[serde(default)]
    pub pubsub_perms: PubSubPermissions,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

/// Custom Debug implementation that redacts the `user_id` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("opaque_user_id", &self.opaque_user_id)
            .field("user_id", &"[REDACTED]")
            .field("channel_id", &self.channel_id)
            .field("role", &self.role)
            .field("pubsub_perms", &self.pubsub_perms)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Verified channel identifier attached to request extensions by the
/// authentication middleware.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
