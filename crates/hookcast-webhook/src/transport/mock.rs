//! Mock transport for testing.
//!
//! Provides [`MockTransport`] for exercising the delivery engine without
//! network access.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::{Transport, WebhookRequest, WebhookResponse};

/// Request captured by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Full request URL.
    pub url: String,
    /// `Content-Type` header value.
    pub content_type: String,
    /// Raw request body.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Request body as text (lossy).
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport replaying scripted outcomes in order.
///
/// Once the script runs out every request gets `204 No Content`.
///
/// # Example
///
/// ```ignore
/// use hookcast_webhook::{MockTransport, WebhookResponse};
///
/// let transport = MockTransport::new()
///     .with_response(WebhookResponse::new(429, "").with_header("Retry-After", "1"))
///     .with_response(WebhookResponse::new(204, ""));
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<WebhookResponse, ureq::Error>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Create a mock that answers every request with `204`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_response(self, response: WebhookResponse) -> Self {
        self.script.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queue a transport failure.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_error(self, error: ureq::Error) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Requests received so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn post(&self, request: &WebhookRequest<'_>) -> Result<WebhookResponse, ureq::Error> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: request.url.to_owned(),
            content_type: request.content_type.to_owned(),
            body: request.body.to_vec(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(WebhookResponse::new(204, "")))
    }
}
