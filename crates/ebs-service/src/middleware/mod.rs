//! Middleware for the extension API.
//!
//! # Components
//!
//! - `auth` - Bearer-token authentication middleware for protected routes

pub mod auth;

pub use auth::{require_broadcaster, AuthState};
