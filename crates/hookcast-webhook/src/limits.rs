//! Limits documented by the Discord webhook API.

/// Maximum characters in message `content`.
pub const MAX_CONTENT: usize = 2000;
/// Maximum number of embeds per message.
pub const MAX_EMBEDS: usize = 10;
/// Maximum characters in an embed title.
pub const MAX_TITLE: usize = 256;
/// Maximum characters in an embed description.
pub const MAX_DESCRIPTION: usize = 4096;
/// Maximum characters in an embed footer text.
pub const MAX_FOOTER: usize = 2048;
/// Maximum characters in an embed author name.
pub const MAX_AUTHOR: usize = 256;
/// Maximum combined characters across the text fields of one embed.
pub const MAX_EMBED_TOTAL: usize = 6000;
/// Maximum number of fields per embed.
pub const MAX_FIELDS: usize = 25;
/// Maximum characters in a field name.
pub const MAX_FIELD_NAME: usize = 256;
/// Maximum characters in a field value.
pub const MAX_FIELD_VALUE: usize = 1024;
/// Maximum number of files uploaded with one message.
pub const MAX_ATTACHMENTS: usize = 10;

/// Message flag that hides link previews (`SUPPRESS_EMBEDS`, bit 2).
pub const SUPPRESS_EMBEDS_FLAG: i64 = 1 << 2;
