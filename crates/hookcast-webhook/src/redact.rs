//! Webhook URL redaction for logs and error messages.
//!
//! Webhook URLs carry their secret token in the path, so everything after
//! `/api/webhooks/` is masked before a URL is shown to the user.

use std::borrow::Cow;

const WEBHOOK_SEGMENT: &str = "/api/webhooks/";
const REDACTION_MARKER: &str = "****redacted****";

/// Masks the secret part of webhook URLs.
///
/// Enabled by default. Held by value wherever URLs are displayed, so two
/// clients with different settings never affect each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redactor {
    enabled: bool,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Redactor {
    /// Create a redactor; `enabled = false` passes URLs through unchanged.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Redact a URL for display.
    #[must_use]
    pub fn redact(self, url: &str) -> Cow<'_, str> {
        if !self.enabled {
            return Cow::Borrowed(url);
        }
        match url.split_once(WEBHOOK_SEGMENT) {
            Some((prefix, _)) => Cow::Owned(format!("{prefix}{WEBHOOK_SEGMENT}{REDACTION_MARKER}")),
            None => Cow::Borrowed(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_webhook_token() {
        let redactor = Redactor::default();
        assert_eq!(
            redactor.redact("https://discord.com/api/webhooks/123/abc"),
            "https://discord.com/api/webhooks/****redacted****"
        );
    }

    #[test]
    fn test_redaction_disabled() {
        let redactor = Redactor::new(false);
        assert_eq!(
            redactor.redact("https://discord.com/api/webhooks/123/abc"),
            "https://discord.com/api/webhooks/123/abc"
        );
    }

    #[test]
    fn test_non_webhook_url_unchanged() {
        let redactor = Redactor::default();
        assert_eq!(
            redactor.redact("https://example.com/hooks/123"),
            "https://example.com/hooks/123"
        );
    }

    #[test]
    fn test_independent_instances() {
        let on = Redactor::default();
        let off = Redactor::new(false);
        let url = "http://127.0.0.1:8080/api/webhooks/1/token";
        assert!(on.redact(url).ends_with(REDACTION_MARKER));
        assert_eq!(off.redact(url), url);
    }
}
