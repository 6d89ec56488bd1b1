//! Rate-limit-aware request execution.
//!
//! The remote configuration store signals throttling with a 429 response and
//! a `Ratelimit-Reset` header carrying an integer seconds-since-epoch reset
//! instant. [`RateLimitedTransport::execute`] sleeps the calling task until
//! that instant and re-issues an identical request, a bounded number of
//! times. Only the triggering task blocks; unrelated requests proceed.

use crate::errors::EbsError;
use crate::observability::metrics::record_rate_limit_wait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::instrument;

/// Header advertising the rate-limit reset instant (Unix epoch seconds).
pub const RATE_LIMIT_RESET_HEADER: &str = "Ratelimit-Reset";

/// Executes requests against the remote store, retrying after advertised
/// rate-limit resets.
#[derive(Clone)]
pub struct RateLimitedTransport {
    client: reqwest::Client,
    max_retries: u32,
    max_wait: Duration,
}

impl RateLimitedTransport {
    /// Create a transport over an already-configured HTTP client.
    ///
    /// # Arguments
    ///
    /// * `max_retries` - Re-issues allowed after a 429 (0 disables retrying)
    /// * `max_wait` - Cap on a single advertised wait; longer waits fail fast
    pub fn new(client: reqwest::Client, max_retries: u32, max_wait: Duration) -> Self {
        Self {
            client,
            max_retries,
            max_wait,
        }
    }

    /// Execute a request and return the response body.
    ///
    /// Success statuses return the full body (empty for 204). A 429 is
    /// retried with the original method, headers, and body unchanged, after
    /// sleeping out the advertised reset; once retries are exhausted the
    /// distinguishable [`EbsError::RateLimited`] is returned. Any other
    /// status is an explicit error rather than a silent empty body.
    #[instrument(
        skip(self, request),
        fields(method = %request.method(), url = %request.url()),
        name = "ebs.transport.execute"
    )]
    pub async fn execute(&self, request: reqwest::Request) -> Result<Bytes, EbsError> {
        let mut retries_left = self.max_retries;
        let mut current = request;

        loop {
            // Clone before sending: the retry must replay the identical request.
            let retry_clone = current.try_clone();

            let response = self.client.execute(current).await.map_err(|e| {
                tracing::warn!(target: "ebs.services.transport", error = %e, "Upstream request failed");
                EbsError::UpstreamUnavailable("configuration store unreachable".to_string())
            })?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if retries_left == 0 {
                    tracing::warn!(target: "ebs.services.transport", "Rate limit still active after retrying");
                    return Err(EbsError::RateLimited);
                }

                let reset = parse_reset_header(&response)?;
                // A reset at or before now means the window already passed:
                // retry immediately without sleeping.
                if let Some(wait) = reset_delay(reset, Utc::now().timestamp()) {
                    if wait > self.max_wait {
                        tracing::warn!(
                            target: "ebs.services.transport",
                            wait_seconds = wait.as_secs(),
                            "Advertised rate-limit wait exceeds cap"
                        );
                        return Err(EbsError::RateLimited);
                    }

                    tracing::debug!(
                        target: "ebs.services.transport",
                        wait_seconds = wait.as_secs(),
                        "Waiting on rate limit to pass"
                    );
                    record_rate_limit_wait(wait);
                    tokio::time::sleep(wait).await;
                }

                current = retry_clone.ok_or_else(|| {
                    tracing::error!(target: "ebs.services.transport", "Request body cannot be replayed");
                    EbsError::Internal
                })?;
                retries_left -= 1;
                continue;
            }

            if status.is_success() {
                return response.bytes().await.map_err(|e| {
                    tracing::warn!(target: "ebs.services.transport", error = %e, "Failed to read upstream body");
                    EbsError::UpstreamUnavailable(
                        "failed to read configuration store response".to_string(),
                    )
                });
            }

            tracing::warn!(
                target: "ebs.services.transport",
                status = status.as_u16(),
                "Unexpected upstream status"
            );
            return Err(EbsError::UpstreamStatus(status.as_u16()));
        }
    }
}

fn parse_reset_header(response: &reqwest::Response) -> Result<i64, EbsError> {
    response
        .headers()
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| {
            tracing::warn!(
                target: "ebs.services.transport",
                "429 without a usable Ratelimit-Reset header"
            );
            EbsError::MalformedResponse(
                "missing or invalid Ratelimit-Reset header".to_string(),
            )
        })
}

/// Remaining wait before the reset instant, `None` once it has passed.
fn reset_delay(reset_epoch: i64, now_epoch: i64) -> Option<Duration> {
    if reset_epoch > now_epoch {
        Some(Duration::from_secs((reset_epoch - now_epoch) as u64))
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    // Retry behavior over the wire (sleep timing, replayed requests,
    // exhausted retries) is covered by tests/config_store_tests.rs against a
    // mock server. Unit tests cover the wall-clock arithmetic.

    use super::*;

    #[test]
    fn test_reset_delay_future_instant() {
        assert_eq!(reset_delay(1002, 1000), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_reset_delay_current_instant() {
        // Reset exactly now: the window has passed, no sleep.
        assert_eq!(reset_delay(1000, 1000), None);
    }

    #[test]
    fn test_reset_delay_past_instant() {
        assert_eq!(reset_delay(990, 1000), None);
    }

    #[test]
    fn test_transport_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<RateLimitedTransport>();
    }
}
