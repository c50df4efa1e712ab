//! Attachment descriptors.
//!
//! Attachments are described on the command line as
//! `PATH[::DESCRIPTION[::CONTENT_TYPE]]`. The display name is the file name
//! and must be unique within one message.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::AttachmentError;

const SPEC_SEPARATOR: &str = "::";

/// A file uploaded alongside a webhook message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    path: PathBuf,
    name: String,
    content_type: String,
    description: Option<String>,
    explicit_content_type: bool,
    embed_only: bool,
}

impl Attachment {
    /// Create an attachment with an inferred content type.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            content_type: content_type.into(),
            description: None,
            explicit_content_type: false,
            embed_only: false,
        }
    }

    /// Override the content type with one declared by the user.
    ///
    /// Declared types are sent to the webhook in the attachment metadata.
    #[must_use]
    pub fn declared_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self.explicit_content_type = true;
        self
    }

    /// Set the alt-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Only upload this file when the payload references it via `attachment://`.
    #[must_use]
    pub fn embed_only(mut self, embed_only: bool) -> Self {
        self.embed_only = embed_only;
        self
    }

    /// Absolute path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name (file name sent to the webhook).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type of the file.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Alt-text description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the content type was declared rather than guessed.
    #[must_use]
    pub fn has_explicit_content_type(&self) -> bool {
        self.explicit_content_type
    }

    /// Whether the file is only sent when referenced from the payload.
    #[must_use]
    pub fn is_embed_only(&self) -> bool {
        self.embed_only
    }
}

/// Build attachments from `PATH[::DESCRIPTION[::CONTENT_TYPE]]` specs.
///
/// `~` is expanded and paths are made absolute. Content types are guessed
/// from the file extension unless declared.
///
/// # Errors
///
/// Returns [`AttachmentError`] if a path is missing, is not a regular file,
/// or two files share a name.
pub fn prepare_attachments<S: AsRef<str>>(
    specs: &[S],
    embed_only: bool,
) -> Result<Vec<Attachment>, AttachmentError> {
    let attachments = specs
        .iter()
        .map(|spec| parse_spec(spec.as_ref(), embed_only))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique_names(&attachments)?;
    Ok(attachments)
}

/// Check that no two attachments share a display name.
///
/// # Errors
///
/// Returns [`AttachmentError::DuplicateName`] naming the first repeated name.
pub fn ensure_unique_names(attachments: &[Attachment]) -> Result<(), AttachmentError> {
    let mut seen = HashSet::new();
    for attachment in attachments {
        if !seen.insert(attachment.name()) {
            return Err(AttachmentError::DuplicateName(attachment.name.clone()));
        }
    }
    Ok(())
}

fn parse_spec(spec: &str, embed_only: bool) -> Result<Attachment, AttachmentError> {
    let mut parts = spec.splitn(3, SPEC_SEPARATOR);
    let raw_path = parts.next().unwrap_or_default().trim();
    let description = non_empty(parts.next());
    let content_type = non_empty(parts.next());

    let path = PathBuf::from(shellexpand::tilde(raw_path).as_ref());
    if !path.exists() {
        return Err(AttachmentError::NotFound(raw_path.to_owned()));
    }
    if !path.is_file() {
        return Err(AttachmentError::NotAFile(raw_path.to_owned()));
    }
    let path = path.canonicalize().map_err(|source| AttachmentError::Io {
        path: raw_path.to_owned(),
        source,
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut attachment = Attachment::new(&path, name, guess_content_type(&path));
    if let Some(content_type) = content_type {
        attachment = attachment.declared_content_type(content_type);
    }
    if let Some(description) = description {
        attachment = attachment.with_description(description);
    }
    Ok(attachment.embed_only(embed_only))
}

fn non_empty(part: Option<&str>) -> Option<&str> {
    part.map(str::trim).filter(|p| !p.is_empty())
}

fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_owned()
}
