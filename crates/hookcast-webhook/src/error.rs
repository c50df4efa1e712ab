//! Error types for webhook validation and delivery.

use std::path::PathBuf;

/// Rendered payload or attachment set violates a documented limit.
///
/// Always describes the first violation found, including the measured value
/// and the limit where one applies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Human-readable description of the violation.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Error from delivering a payload to a webhook.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// No target URL was given.
    #[error("No webhook URL provided")]
    NoTargets,

    /// HTTP request failed (network error, timeout, invalid URL).
    #[error("Webhook request failed for {url}: {source}")]
    HttpRequest {
        /// Target URL, redacted unless redaction is disabled.
        url: String,
        /// Underlying client error.
        source: ureq::Error,
    },

    /// Webhook answered with an error status.
    #[error("Webhook POST failed ({status}) for {url}: {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Target URL, redacted unless redaction is disabled.
        url: String,
        /// Start of the response body.
        body: String,
    },

    /// An attachment file could not be opened or read.
    #[error("Failed to read attachment {}: {source}", path.display())]
    Attachment {
        /// Attachment path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Payload could not be encoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeliveryError {
    /// HTTP status code returned by the webhook, if the failure came from one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the webhook kept rate limiting the request.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

/// Error while preparing attachment descriptors.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    /// Path does not exist.
    #[error("Attachment '{0}' does not exist")]
    NotFound(String),

    /// Path exists but is not a regular file.
    #[error("Attachment '{0}' is not a file")]
    NotAFile(String),

    /// Two attachments share a display name.
    #[error("Attachment name '{0}' is used more than once")]
    DuplicateName(String),

    /// Path could not be resolved.
    #[error("Attachment '{path}' could not be resolved: {source}")]
    Io {
        /// Path as given.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
