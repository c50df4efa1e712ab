//! Rate-limit backoff.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::transport::WebhookResponse;

/// Longest sleep before the single retry.
pub(crate) const MAX_RETRY_SLEEP: Duration = Duration::from_secs(5);

/// Where a target's delivery stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attempt {
    First,
    Retried,
}

impl Attempt {
    /// Next state after a rate-limited response, or `None` if retrying is
    /// not allowed.
    pub(crate) fn after_rate_limit(self, retry: bool) -> Option<Self> {
        match self {
            Self::First if retry => Some(Self::Retried),
            _ => None,
        }
    }
}

/// Seconds to wait before retrying a rate-limited request.
///
/// Checks `Retry-After`, then `X-RateLimit-Reset-After`, then the body's
/// `retry_after`. Missing, negative or unparsable values give zero.
pub(crate) fn retry_delay(response: &WebhookResponse) -> f64 {
    let delay = header_delay(response)
        .or_else(|| body_delay(&response.body))
        .unwrap_or(0.0);
    if delay.is_finite() && delay > 0.0 {
        delay
    } else {
        0.0
    }
}

/// Sleep duration for a delay in seconds, capped at [`MAX_RETRY_SLEEP`].
pub(crate) fn capped_sleep(delay: f64) -> Option<Duration> {
    if !delay.is_finite() || delay <= 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(
        delay.min(MAX_RETRY_SLEEP.as_secs_f64()),
    ))
}

fn header_delay(response: &WebhookResponse) -> Option<f64> {
    let value = ["Retry-After", "X-RateLimit-Reset-After"]
        .into_iter()
        .filter_map(|name| response.header(name))
        .map(str::trim)
        .find(|value| !value.is_empty())?;

    match value.parse::<f64>() {
        Ok(seconds) => Some(seconds),
        Err(_) => {
            debug!("Ignoring unparsable rate limit header: {value}");
            None
        }
    }
}

fn body_delay(body: &str) -> Option<f64> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("retry_after")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
