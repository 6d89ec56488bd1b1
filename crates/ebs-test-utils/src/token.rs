//! Token-signing helpers for tests.
//!
//! Builds HS256 tokens over arbitrary claims so tests can craft valid,
//! expired, mis-scoped, or mis-signed inputs without going through the
//! service's own codec.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

/// Base64 of the shared secret used across the test suite
/// ("super-secret-signing-key").
pub const TEST_SECRET_B64: &str = "c3VwZXItc2VjcmV0LXNpZ25pbmcta2V5";

/// Signs test tokens with a fixed secret.
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    /// Signer over the suite's default shared secret.
    pub fn new() -> Self {
        Self::from_base64(TEST_SECRET_B64)
    }

    /// Signer over an arbitrary base64-encoded secret.
    pub fn from_base64(secret_b64: &str) -> Self {
        let key = BASE64_STANDARD
            .decode(secret_b64)
            .expect("test secret must be valid base64");
        Self { key }
    }

    /// Sign arbitrary claims as HS256.
    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with_algorithm(Algorithm::HS256, claims)
    }

    /// Sign with an explicit algorithm (for algorithm-confusion tests).
    pub fn sign_with_algorithm(&self, algorithm: Algorithm, claims: &Value) -> String {
        encode(
            &Header::new(algorithm),
            claims,
            &EncodingKey::from_secret(&self.key),
        )
        .expect("failed to sign test token")
    }
}

impl Default for TokenSigner {
    fn default() -> Self {
        Self::new()
    }
}

/// Claims for a broadcaster token on the given channel, expiring in an hour.
pub fn broadcaster_claims(channel_id: &str) -> Value {
    claims_with_role("broadcaster", channel_id)
}

/// Claims for a token with an arbitrary role on the given channel.
pub fn claims_with_role(role: &str, channel_id: &str) -> Value {
    json!({
        "opaque_user_id": format!("U{channel_id}"),
        "user_id": channel_id,
        "channel_id": channel_id,
        "role": role,
        "pubsub_perms": { "listen": ["broadcast"] },
        "exp": Utc::now().timestamp() + 3600,
    })
}
