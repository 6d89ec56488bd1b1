//! Extension Backend Service (EBS) Library
//!
//! This library provides the backend half of the animal-facts broadcaster
//! extension:
//!
//! - Inbound bearer-token validation for the extension API
//! - Outbound token issuance toward the remote configuration store
//! - A rate-limit-aware transport around the store's HTTP protocol
//! - The random fact endpoint wiring it all together
//!
//! # Architecture
//!
//! The service follows the Middleware -> Handler -> Service pattern:
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> services/*.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Identity token claims and the HMAC mint/verify codec
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Bearer-token authentication middleware
//! - `models` - Data models
//! - `observability` - Metrics definitions
//! - `routes` - Axum router setup
//! - `services` - Remote store client, transport, and fact lists

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
