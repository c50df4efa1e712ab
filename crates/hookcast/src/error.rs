//! CLI error types.

use hookcast_config::ConfigError;
use hookcast_template::TemplateError;
use hookcast_webhook::{AttachmentError, DeliveryError, ValidationError};

/// Exit code for invalid input, configuration, attachments or a missing
/// template file.
pub(crate) const EXIT_VALIDATION: u8 = 2;
/// Exit code for a webhook request that failed.
pub(crate) const EXIT_HTTP_ERROR: u8 = 3;
/// Exit code for a request still rate limited after the retry.
pub(crate) const EXIT_RATE_LIMIT: u8 = 4;
/// Exit code for template problems.
pub(crate) const EXIT_TEMPLATE_ERROR: u8 = 5;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("{0}")]
    Attachment(#[from] AttachmentError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Delivery(#[from] DeliveryError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Process exit code for this error.
    pub(crate) fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Attachment(_) | Self::Validation(_) | Self::Usage(_) => {
                EXIT_VALIDATION
            }
            Self::Template(TemplateError::NotFound(_)) => EXIT_VALIDATION,
            Self::Template(_) => EXIT_TEMPLATE_ERROR,
            Self::Delivery(DeliveryError::NoTargets) => EXIT_VALIDATION,
            Self::Delivery(err) if err.is_rate_limited() => EXIT_RATE_LIMIT,
            Self::Delivery(_) => EXIT_HTTP_ERROR,
            Self::Io(_) | Self::Json(_) => 1,
        }
    }
}
