//! Identity token handling.
//!
//! Issuance and verification share one secret and one HMAC algorithm: both
//! directions of trust (service -> store, platform -> service) are the same
//! kind of short-lived bearer credential.
//!
//! # Components
//!
//! - `claims` - Token payload types
//! - `codec` - HMAC-SHA256 mint/verify

pub mod claims;
pub mod codec;

pub use claims::{ChannelId, Claims, PubSubPermissions, Role};
pub use codec::{TokenCodec, TokenSecretError};
