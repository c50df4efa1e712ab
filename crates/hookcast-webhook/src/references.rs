//! `attachment://` reference scanning.
//!
//! Embeds point at uploaded files with `attachment://<name>` URLs. Files
//! marked embed-only are dropped unless some string in the payload
//! references them.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::Payload;
use crate::attachment::Attachment;

const MARKER: &str = "attachment://";

/// Collect every display name referenced through `attachment://` in the payload.
///
/// Only string values are scanned, never object keys. A reference ends at
/// whitespace, a quote, a bracket or a pipe.
#[must_use]
pub fn collect_attachment_references(payload: &Payload) -> HashSet<String> {
    let mut references = HashSet::new();
    for value in payload.values() {
        collect(value, &mut references);
    }
    references
}

/// Partition attachments into `(used, unused)`, keeping input order.
///
/// Attachments without the embed-only flag are always used. Embed-only
/// attachments are used only when the payload references their name.
#[must_use]
pub fn split_attachments(
    payload: &Payload,
    attachments: &[Attachment],
) -> (Vec<Attachment>, Vec<Attachment>) {
    let references = collect_attachment_references(payload);
    let (used, unused): (Vec<_>, Vec<_>) = attachments
        .iter()
        .cloned()
        .partition(|a| !a.is_embed_only() || references.contains(a.name()));

    for attachment in &unused {
        debug!("Attachment '{}' is not referenced by the payload", attachment.name());
    }
    (used, unused)
}

fn collect(value: &Value, references: &mut HashSet<String>) {
    match value {
        Value::String(text) => collect_from_text(text, references),
        Value::Array(items) => {
            for item in items {
                collect(item, references);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect(item, references);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

fn collect_from_text(text: &str, references: &mut HashSet<String>) {
    let mut rest = text;
    while let Some(start) = rest.find(MARKER) {
        let after = &rest[start + MARKER.len()..];
        let end = after.find(is_boundary).unwrap_or(after.len());
        if end > 0 {
            references.insert(after[..end].to_owned());
        }
        rest = &after[end..];
    }
}

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '(' | ')' | '[' | ']' | '{' | '}' | '|')
}
