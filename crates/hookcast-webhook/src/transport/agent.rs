//! Blocking HTTP transport backed by `ureq`.

use std::time::Duration;

use ureq::Agent;

use super::{Transport, WebhookRequest, WebhookResponse};

/// Default HTTP timeout for one webhook request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport using a pooled `ureq` agent.
///
/// Error statuses are returned as responses so the engine can inspect
/// rate-limit headers.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl UreqTransport {
    /// Create a transport with its own agent and the given global timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn post(&self, request: &WebhookRequest<'_>) -> Result<WebhookResponse, ureq::Error> {
        let response = self
            .agent
            .post(request.url)
            .header("Content-Type", request.content_type)
            .header("Accept", "application/json")
            .send(request.body)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();
        let bytes = response.into_body().read_to_vec()?;

        Ok(WebhookResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}
