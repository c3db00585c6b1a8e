use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::warn;

use crate::error::{KreatError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given zero-based attempt, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn wait_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .unwrap_or_else(|| self.delay_for(attempt))
            .min(self.max_delay)
    }
}

/// Reads a `Retry-After` header given in whole seconds. HTTP-date values are
/// ignored and fall back to the computed backoff.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Sends the request built by `build` until it succeeds, fails with a
/// non-retryable status, or the policy runs out of attempts.
pub async fn send_with_retry<F>(policy: &RetryPolicy, service: &str, build: F) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 0..attempts {
        let last = attempt + 1 == attempts;

        let response = match build().send().await {
            Ok(response) => response,
            Err(err) => {
                if last {
                    return Err(KreatError::Upstream(format!("{service} transport failed: {err}")));
                }
                let wait = policy.wait_for(attempt, None);
                warn!(
                    %service,
                    attempt = attempt + 1,
                    ?wait,
                    error = %err,
                    "transport error, retrying"
                );
                tokio::time::sleep(wait).await;
                continue;
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let hinted = retry_after(response.headers());
        if is_retryable_status(status) && !last {
            let wait = policy.wait_for(attempt, hinted);
            warn!(%service, attempt = attempt + 1, %status, ?wait, "upstream not ready, retrying");
            tokio::time::sleep(wait).await;
            continue;
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(KreatError::RateLimited(format!(
                "{service} still rate limited after {attempts} attempts: {body}"
            )));
        }
        return Err(KreatError::Upstream(format!("{service} failed ({status}): {body}")));
    }

    Err(KreatError::Upstream(format!("{service} failed after {attempts} attempts")))
}
