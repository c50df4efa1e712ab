//! Webhook delivery engine.
//!
//! [`WebhookClient`] posts one finalized payload to each target URL in turn.
//! Payloads without attachments go out as JSON; with attachments the body is
//! `multipart/form-data` with a `payload_json` part followed by `files[n]`
//! parts. A `429` response is retried once after the advertised delay, capped
//! at five seconds. The first failing target aborts the rest.

mod multipart;
mod retry;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::time::Duration;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::Payload;
use crate::attachment::Attachment;
use crate::error::DeliveryError;
use crate::redact::Redactor;
use crate::transport::{DEFAULT_TIMEOUT, Transport, UreqTransport, WebhookRequest};
use multipart::MultipartForm;
use retry::{Attempt, capped_sleep, retry_delay};

/// Characters of the response body kept in error messages.
const ERROR_BODY_LIMIT: usize = 1000;

/// Delivery settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Retry once after a `429` response.
    pub retry: bool,
    /// Post into this thread of a forum or media channel.
    pub thread_id: Option<String>,
    /// HTTP timeout per request.
    pub timeout: Duration,
    /// Mask webhook tokens in logs and errors.
    pub redact: bool,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            retry: true,
            thread_id: None,
            timeout: DEFAULT_TIMEOUT,
            redact: true,
        }
    }
}

/// Successful delivery to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Target URL as given by the caller.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

/// Delivers payloads over a [`Transport`].
///
/// The transport is kept for the lifetime of the client, so one client can
/// serve many deliveries over the same connection pool.
pub struct WebhookClient<T = UreqTransport> {
    transport: T,
    options: DeliveryOptions,
    redactor: Redactor,
    sleep: Box<dyn Fn(Duration)>,
}

impl WebhookClient<UreqTransport> {
    /// Create a client with its own HTTP agent.
    #[must_use]
    pub fn new(options: DeliveryOptions) -> Self {
        Self::with_transport(UreqTransport::new(options.timeout), options)
    }
}

impl<T: Transport> WebhookClient<T> {
    /// Create a client on top of an existing transport.
    ///
    /// `options.timeout` is not applied here; the transport owns its timeout.
    #[must_use]
    pub fn with_transport(transport: T, options: DeliveryOptions) -> Self {
        Self {
            transport,
            redactor: Redactor::new(options.redact),
            options,
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replace the function used to wait before a retry.
    #[must_use]
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    /// Current settings.
    #[must_use]
    pub fn options(&self) -> &DeliveryOptions {
        &self.options
    }

    /// Deliver a payload to every URL, in order.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::NoTargets`] if `urls` is empty, otherwise the
    /// first failure. Targets after a failure are not attempted.
    pub fn deliver<U: AsRef<str>>(
        &self,
        urls: &[U],
        payload: &Payload,
        attachments: &[Attachment],
    ) -> Result<Vec<DeliveryResult>, DeliveryError> {
        if urls.is_empty() {
            return Err(DeliveryError::NoTargets);
        }

        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            let url = url.as_ref();
            info!("Sending webhook payload to {}", self.redactor.redact(url));
            results.push(self.post_to_webhook(url, payload, attachments)?);
        }
        Ok(results)
    }

    /// Deliver a payload to a single URL.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if an attachment cannot be read, the request
    /// fails, or the webhook answers with status 400 or above.
    pub fn post_to_webhook(
        &self,
        url: &str,
        payload: &Payload,
        attachments: &[Attachment],
    ) -> Result<DeliveryResult, DeliveryError> {
        let target = target_url(url, self.options.thread_id.as_deref());
        let mut files = OpenAttachments::open(attachments)?;
        let mut attempt = Attempt::First;

        loop {
            let (content_type, body) = encode_body(payload, &mut files)?;
            let response = self
                .transport
                .post(&WebhookRequest {
                    url: &target,
                    content_type: &content_type,
                    body: &body,
                })
                .map_err(|source| DeliveryError::HttpRequest {
                    url: self.redactor.redact(url).into_owned(),
                    source,
                })?;

            if response.status == 429
                && let Some(next) = attempt.after_rate_limit(self.options.retry)
            {
                let delay = retry_delay(&response);
                warn!(
                    "Rate limited by {}; retrying in {delay:.2}s",
                    self.redactor.redact(url)
                );
                if let Some(duration) = capped_sleep(delay) {
                    (self.sleep)(duration);
                }
                attempt = next;
                continue;
            }

            if response.status >= 400 {
                return Err(DeliveryError::HttpResponse {
                    status: response.status,
                    url: self.redactor.redact(url).into_owned(),
                    body: response.body.chars().take(ERROR_BODY_LIMIT).collect(),
                });
            }

            debug!("Webhook answered {}", response.status);
            return Ok(DeliveryResult {
                url: url.to_owned(),
                status: response.status,
                body: response.body,
            });
        }
    }
}

/// Deliver a payload with a client created for this call only.
///
/// # Errors
///
/// See [`WebhookClient::deliver`].
pub fn deliver_payload<U: AsRef<str>>(
    urls: &[U],
    payload: &Payload,
    attachments: &[Attachment],
    options: &DeliveryOptions,
) -> Result<Vec<DeliveryResult>, DeliveryError> {
    if urls.is_empty() {
        return Err(DeliveryError::NoTargets);
    }
    WebhookClient::new(options.clone()).deliver(urls, payload, attachments)
}

/// Attachment files held open for one target; closed on drop.
struct OpenAttachments<'a> {
    files: Vec<(&'a Attachment, File)>,
}

impl<'a> OpenAttachments<'a> {
    fn open(attachments: &'a [Attachment]) -> Result<Self, DeliveryError> {
        let files = attachments
            .iter()
            .map(|attachment| {
                File::open(attachment.path())
                    .map(|file| (attachment, file))
                    .map_err(|source| DeliveryError::Attachment {
                        path: attachment.path().to_path_buf(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { files })
    }

    fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn read_from_start(attachment: &Attachment, file: &mut File) -> Result<Vec<u8>, DeliveryError> {
    let mut data = Vec::new();
    file.seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_end(&mut data))
        .map_err(|source| DeliveryError::Attachment {
            path: attachment.path().to_path_buf(),
            source,
        })?;
    Ok(data)
}

fn encode_body(
    payload: &Payload,
    files: &mut OpenAttachments<'_>,
) -> Result<(String, Vec<u8>), DeliveryError> {
    if files.is_empty() {
        return Ok(("application/json".to_owned(), serde_json::to_vec(payload)?));
    }

    let mut payload_json = payload.clone();
    let metadata = files
        .files
        .iter()
        .enumerate()
        .map(|(index, (attachment, _))| attachment_metadata(index, attachment))
        .collect();
    payload_json.insert("attachments".to_owned(), Value::Array(metadata));

    let mut form = MultipartForm::new();
    form.text(
        "payload_json",
        "application/json",
        &serde_json::to_string(&payload_json)?,
    );
    for (index, (attachment, file)) in files.files.iter_mut().enumerate() {
        let data = read_from_start(attachment, file)?;
        form.file(
            &format!("files[{index}]"),
            attachment.name(),
            attachment.content_type(),
            &data,
        );
    }
    Ok(form.finish())
}

fn attachment_metadata(index: usize, attachment: &Attachment) -> Value {
    let mut entry = Map::new();
    entry.insert("id".to_owned(), Value::from(index.to_string()));
    entry.insert("filename".to_owned(), Value::from(attachment.name()));
    if let Some(description) = attachment.description() {
        entry.insert("description".to_owned(), Value::from(description));
    }
    if attachment.has_explicit_content_type() {
        entry.insert(
            "content_type".to_owned(),
            Value::from(attachment.content_type()),
        );
    }
    Value::Object(entry)
}

/// Append `wait=true` and the optional thread id to a webhook URL.
///
/// The query goes before any `#fragment`.
fn target_url(url: &str, thread_id: Option<&str>) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    let mut target = format!("{base}{separator}wait=true");
    if let Some(thread_id) = thread_id.filter(|id| !id.is_empty()) {
        target.push_str("&thread_id=");
        target.extend(utf8_percent_encode(thread_id, NON_ALPHANUMERIC));
    }
    if let Some(fragment) = fragment {
        target.push('#');
        target.push_str(fragment);
    }
    target
}
