//! Service configuration.
//!
//! Configuration is loaded from environment variables. The shared extension
//! secret is held as a [`SecretString`] so `Debug` output and logs can never
//! expose it.

use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8081";

/// Default base URL of the remote configuration store API.
pub const DEFAULT_CONFIG_API_BASE_URL: &str = "https://api.twitch.tv";

/// Default number of re-issues after a rate-limited upstream response.
pub const DEFAULT_RATE_LIMIT_MAX_RETRIES: u32 = 1;

/// Upper bound on configured rate-limit retries.
pub const MAX_RATE_LIMIT_MAX_RETRIES: u32 = 5;

/// Default cap on a single advertised rate-limit wait, in seconds.
pub const DEFAULT_RATE_LIMIT_MAX_WAIT_SECONDS: u64 = 30;

/// Upper bound on the configurable rate-limit wait cap, in seconds.
pub const MAX_RATE_LIMIT_MAX_WAIT_SECONDS: u64 = 300;

/// Service configuration.
///
/// Loaded from environment variables with sensible defaults. The extension
/// secret is redacted in Debug output via `SecretString`.
#[derive(Clone, Debug)]
pub struct Config {
    /// Extension client identifier, sent as the `Client-Id` header.
    pub client_id: String,

    /// Base64-encoded shared signing secret.
    pub secret: SecretString,

    /// User id of the extension owner, embedded in outbound tokens.
    pub owner_user_id: String,

    /// Server bind address (default: "0.0.0.0:8081").
    pub bind_address: String,

    /// Base URL of the remote configuration store API.
    pub config_api_base_url: String,

    /// Re-issues allowed after a rate-limited upstream response.
    pub rate_limit_max_retries: u32,

    /// Cap on a single advertised rate-limit wait, in seconds.
    pub rate_limit_max_wait_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid rate limit retry configuration: {0}")]
    InvalidRateLimitRetries(String),

    #[error("Invalid rate limit wait configuration: {0}")]
    InvalidRateLimitWait(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let client_id = vars
            .get("EXT_CLIENT_ID")
            .ok_or_else(|| ConfigError::MissingEnvVar("EXT_CLIENT_ID".to_string()))?
            .clone();

        let secret = vars
            .get("EXT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("EXT_SECRET".to_string()))
            .map(|s| SecretString::from(s.clone()))?;

        let owner_user_id = vars
            .get("EXT_OWNER_ID")
            .ok_or_else(|| ConfigError::MissingEnvVar("EXT_OWNER_ID".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let config_api_base_url = vars
            .get("EXT_API_BASE_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_API_BASE_URL.to_string());

        // Parse rate-limit retries with validation
        let rate_limit_max_retries = if let Some(value_str) = vars.get("RATE_LIMIT_MAX_RETRIES") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidRateLimitRetries(format!(
                    "RATE_LIMIT_MAX_RETRIES must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value > MAX_RATE_LIMIT_MAX_RETRIES {
                return Err(ConfigError::InvalidRateLimitRetries(format!(
                    "RATE_LIMIT_MAX_RETRIES must not exceed {}, got {}",
                    MAX_RATE_LIMIT_MAX_RETRIES, value
                )));
            }

            value
        } else {
            DEFAULT_RATE_LIMIT_MAX_RETRIES
        };

        // Parse the rate-limit wait cap with validation
        let rate_limit_max_wait_seconds =
            if let Some(value_str) = vars.get("RATE_LIMIT_MAX_WAIT_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidRateLimitWait(format!(
                        "RATE_LIMIT_MAX_WAIT_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidRateLimitWait(
                        "RATE_LIMIT_MAX_WAIT_SECONDS must be greater than 0".to_string(),
                    ));
                }

                if value > MAX_RATE_LIMIT_MAX_WAIT_SECONDS {
                    return Err(ConfigError::InvalidRateLimitWait(format!(
                        "RATE_LIMIT_MAX_WAIT_SECONDS must not exceed {}, got {}",
                        MAX_RATE_LIMIT_MAX_WAIT_SECONDS, value
                    )));
                }

                value
            } else {
                DEFAULT_RATE_LIMIT_MAX_WAIT_SECONDS
            };

        Ok(Config {
            client_id,
            secret,
            owner_user_id,
            bind_address,
            config_api_base_url,
            rate_limit_max_retries,
            rate_limit_max_wait_seconds,
        })
    }
}
