//! Metrics definitions.
//!
//! All metrics follow Prometheus naming conventions:
//! - `ebs_` prefix for the extension backend
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion: `outcome` and
//! `operation` values come from fixed sets in code, never from request data.

use metrics::{counter, histogram};
use std::time::Duration;

/// Record the outcome of an inbound authentication attempt.
///
/// Metric: `ebs_auth_requests_total`
/// Label: `outcome` in {missing, malformed, invalid, forbidden, validated}
pub fn record_auth_outcome(outcome: &'static str) {
    counter!("ebs_auth_requests_total", "outcome" => outcome).increment(1);
}

/// Record a completed configuration store request.
///
/// Metric: `ebs_upstream_requests_total`
/// Labels: `operation` in {get_segments, put_segment}, `outcome` in
/// {success, error}
pub fn record_upstream_request(operation: &'static str, outcome: &'static str) {
    counter!(
        "ebs_upstream_requests_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a rate-limit wait imposed by the configuration store.
///
/// Metrics: `ebs_upstream_rate_limited_total`,
/// `ebs_upstream_rate_limit_wait_seconds`
pub fn record_rate_limit_wait(wait: Duration) {
    counter!("ebs_upstream_rate_limited_total").increment(1);
    histogram!("ebs_upstream_rate_limit_wait_seconds").record(wait.as_secs_f64());
}
