//! HTTP request handlers for the extension API.

pub mod facts;
pub mod health;
pub mod metrics;

pub use facts::random_fact;
pub use health::health_check;
pub use metrics::metrics_handler;
