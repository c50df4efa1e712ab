//! HTTP transport used by the delivery engine.
//!
//! [`Transport`] posts one fully encoded request and hands back the raw
//! response. Rate-limit handling, error mapping and redaction live in the
//! engine, so transports stay dumb:
//!
//! - [`UreqTransport`] wraps a pooled `ureq` agent
//! - [`MockTransport`] replays scripted responses (behind the `mock` feature)

mod agent;
#[cfg(any(test, feature = "mock"))]
mod mock;
#[cfg(test)]
pub(crate) mod stub;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockTransport, RecordedRequest};
pub use agent::{DEFAULT_TIMEOUT, UreqTransport};

/// Outgoing webhook request.
#[derive(Debug, Clone, Copy)]
pub struct WebhookRequest<'a> {
    /// Full request URL including the query string.
    pub url: &'a str,
    /// `Content-Type` header value.
    pub content_type: &'a str,
    /// Encoded request body.
    pub body: &'a [u8],
}

/// Response received from a webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    /// HTTP status code.
    pub status: u16,
    headers: Vec<(String, String)>,
    /// Response body as text.
    pub body: String,
}

impl WebhookResponse {
    /// Create a response without headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value (case-insensitive name).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Sends encoded webhook requests.
///
/// Implementations are used sequentially; one instance can serve every
/// target of a delivery and be reused across deliveries.
pub trait Transport {
    /// POST the request and return the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns the client error when no response was received (connection
    /// failure, timeout, invalid URL).
    fn post(&self, request: &WebhookRequest<'_>) -> Result<WebhookResponse, ureq::Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, request: &WebhookRequest<'_>) -> Result<WebhookResponse, ureq::Error> {
        (**self).post(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = WebhookResponse::new(429, "").with_header("retry-after", "2");

        assert_eq!(response.header("Retry-After"), Some("2"));
        assert_eq!(response.header("X-RateLimit-Reset-After"), None);
    }
}
