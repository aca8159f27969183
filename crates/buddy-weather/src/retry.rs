//! Retry with exponential backoff for the weather APIs.
//!
//! Retried: timeouts, connection failures, 408, 429 and 5xx.
//! Not retried: any other 4xx, which means the request itself is wrong.

use std::future::Future;
use std::time::Duration;

use buddy_core::{NetworkError, ReqwestErrorExt};
use reqwest::{Response, StatusCode};

use crate::types::WeatherError;

pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_DELAY_MS: u64 = 4000;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry, doubled each attempt
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_retries(3)
    }
}

impl RetryPolicy {
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::with_retries(0)
    }

    /// Backoff before retry number `attempt` (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }
    error.status().is_some_and(is_retryable_status)
}

/// Open-Meteo reports request problems as `{"error": true, "reason": "..."}`.
async fn error_reason(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("reason").and_then(|r| r.as_str()).map(String::from))
        .unwrap_or(text)
}

/// Send a request, retrying transient failures. Non-success responses
/// that are not retried become [`NetworkError::ServerError`].
pub async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    operation: F,
) -> Result<Response, WeatherError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay_for_attempt(attempt - 1);
            tracing::info!(
                "Retry attempt {} of {}, waiting {:?}",
                attempt,
                policy.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
        let can_retry = attempt < policy.max_retries;
        attempt += 1;

        match operation().await {
            Ok(response) if response.status().is_success() => return Ok(response),
            Ok(response) => {
                let status = response.status();
                if is_retryable_status(status) && can_retry {
                    tracing::warn!("Weather API returned {}, retrying", status);
                    continue;
                }
                let message = error_reason(response).await;
                tracing::debug!("Weather API returned {}: {}", status, message);
                return Err(NetworkError::ServerError {
                    status: status.as_u16(),
                    message,
                }
                .into());
            }
            Err(e) => {
                if is_retryable_error(&e) && can_retry {
                    tracing::warn!("Retryable network error: {}", e);
                    continue;
                }
                return Err(e.into_network_error().into());
            }
        }
    }
}
