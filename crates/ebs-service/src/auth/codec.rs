//! Identity token mint and verify.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only HMAC-SHA256 is accepted; the algorithm advertised in the token
//!   header is checked against the allow-list (algorithm-confusion defense)
//! - Expiration is validated with zero leeway
//! - Generic error messages prevent information leakage

use crate::auth::claims::{Claims, PubSubPermissions, Role};
use crate::errors::EbsError;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Lifetime of tokens issued by this service, in seconds.
pub const TOKEN_TTL_SECS: i64 = 180;

/// The single topic outbound tokens are allowed to publish to.
pub const BROADCAST_TOPIC: &str = "broadcast";

/// Maximum allowed token size in bytes (8KB), checked before any parsing.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Generic client-facing message for every verification failure.
const GENERIC_TOKEN_ERROR: &str = "The access token is invalid or expired";

/// Errors building a codec from the configured shared secret.
///
/// These are startup-invariant violations: the process must not serve
/// traffic without a usable signing secret.
#[derive(Debug, Error)]
pub enum TokenSecretError {
    #[error("shared secret is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("shared secret must not be empty")]
    Empty,
}

/// Mints and verifies the signed identity tokens both trust boundaries use.
///
/// Holds the keys derived from the shared secret; built once at startup and
/// read-only afterwards, so it can be shared across requests via `Arc`.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    owner_user_id: String,
}

impl TokenCodec {
    /// Build a codec from the base64-encoded shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`TokenSecretError`] if the secret is missing its base64
    /// encoding or decodes to nothing.
    pub fn from_base64_secret(
        secret: &SecretString,
        owner_user_id: String,
    ) -> Result<Self, TokenSecretError> {
        let key = BASE64_STANDARD.decode(secret.expose_secret())?;
        if key.is_empty() {
            return Err(TokenSecretError::Empty);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiration must be strictly in the future at verification time.
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&key),
            decoding_key: DecodingKey::from_secret(&key),
            validation,
            owner_user_id,
        })
    }

    /// Mint a service token, optionally scoped to a channel.
    ///
    /// The token carries role `external`, publish permission on the
    /// `broadcast` topic, and expires [`TOKEN_TTL_SECS`] from now.
    pub fn issue(&self, channel_id: Option<&str>) -> Result<String, EbsError> {
        let claims = Claims {
            opaque_user_id: None,
            user_id: self.owner_user_id.clone(),
            channel_id: channel_id.map(str::to_owned),
            role: Role::External,
            pubsub_perms: PubSubPermissions {
                send: Some(vec![BROADCAST_TOPIC.to_string()]),
                listen: None,
            },
            exp: Utc::now().timestamp() + TOKEN_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(target: "ebs.auth.codec", error = %e, "Failed to sign outbound token");
            EbsError::Internal
        })
    }

    /// Decode and validate a token, returning its claims.
    ///
    /// # Errors
    ///
    /// Returns `EbsError::InvalidToken` with a generic message when the token
    /// is oversized, advertises a non-HMAC-SHA256 algorithm, carries a bad
    /// signature, is expired, or cannot be parsed.
    pub fn verify(&self, token: &str) -> Result<Claims, EbsError> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(target: "ebs.auth.codec", size = token.len(), "Token exceeds size limit");
            return Err(EbsError::InvalidToken(GENERIC_TOKEN_ERROR.to_string()));
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(target: "ebs.auth.codec", error = %e, "Token verification failed");
            EbsError::InvalidToken(GENERIC_TOKEN_ERROR.to_string())
        })?;

        Ok(data.claims)
    }
}
