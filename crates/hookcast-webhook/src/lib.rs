//! Webhook payload validation and delivery for hookcast.
//!
//! This crate takes a rendered JSON payload plus a set of attachment files and
//! gets them to one or more chat webhooks:
//!
//! - [`prepare_attachments`] turns `PATH::DESCRIPTION::TYPE` specs into
//!   [`Attachment`] descriptors
//! - [`split_attachments`] drops embed-only files the payload never references
//! - [`finalize_payload`] applies the mention policy and suppress-embeds flag
//! - [`validate_payload`] checks the documented platform limits
//! - [`WebhookClient`] posts the payload, retrying once on rate limits
//!
//! Webhook URLs carry a secret token, so logs and errors pass them through a
//! [`Redactor`] first.
//!
//! # Example
//!
//! ```ignore
//! use hookcast_webhook::{DeliveryOptions, WebhookClient, finalize_payload, validate_payload};
//!
//! let payload = finalize_payload(&rendered, None, false);
//! validate_payload(&payload, &attachments)?;
//! let client = WebhookClient::new(DeliveryOptions::default());
//! client.deliver(&urls, &payload, &attachments)?;
//! ```

mod attachment;
mod delivery;
mod error;
mod finalize;
pub mod limits;
mod redact;
mod references;
mod transport;
mod validate;

pub use attachment::{Attachment, ensure_unique_names, prepare_attachments};
pub use delivery::{DeliveryOptions, DeliveryResult, WebhookClient, deliver_payload};
pub use error::{AttachmentError, DeliveryError, ValidationError};
pub use finalize::finalize_payload;
pub use redact::Redactor;
pub use references::{collect_attachment_references, split_attachments};
#[cfg(any(test, feature = "mock"))]
pub use transport::{MockTransport, RecordedRequest};
pub use transport::{DEFAULT_TIMEOUT, Transport, UreqTransport, WebhookRequest, WebhookResponse};
pub use validate::validate_payload;

/// A webhook message body: a JSON object.
pub type Payload = serde_json::Map<String, serde_json::Value>;
