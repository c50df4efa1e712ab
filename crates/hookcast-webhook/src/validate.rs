//! Payload validation against the Discord webhook limits.
//!
//! Checks run in a fixed order (content, then embeds in index order, then
//! attachments) and stop at the first violation.

use chrono::{NaiveDate, Weekday};
use serde_json::{Map, Value};

use crate::Payload;
use crate::attachment::Attachment;
use crate::error::ValidationError;
use crate::limits::{
    MAX_ATTACHMENTS, MAX_AUTHOR, MAX_CONTENT, MAX_DESCRIPTION, MAX_EMBED_TOTAL, MAX_EMBEDS,
    MAX_FIELD_NAME, MAX_FIELD_VALUE, MAX_FIELDS, MAX_FOOTER, MAX_TITLE,
};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const MEDIA_KEYS: [&str; 4] = ["thumbnail", "image", "video", "provider"];

/// Validate a finalized payload and the attachments that will be uploaded.
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violated limit.
pub fn validate_payload(payload: &Payload, attachments: &[Attachment]) -> Result<(), ValidationError> {
    validate_content(payload.get("content"))?;
    validate_embeds(payload.get("embeds"))?;

    if attachments.len() > MAX_ATTACHMENTS {
        return Err(ValidationError::new(format!(
            "Discord allows at most {MAX_ATTACHMENTS} attachments ({}/{MAX_ATTACHMENTS})",
            attachments.len()
        )));
    }
    Ok(())
}

/// Treat JSON `null` the same as a missing key.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn validate_content(content: Option<&Value>) -> Result<(), ValidationError> {
    let Some(content) = present(content) else {
        return Ok(());
    };
    let Value::String(text) = content else {
        return Err(ValidationError::new("content must be a string"));
    };
    let len = char_len(text);
    if len > MAX_CONTENT {
        return Err(ValidationError::new(format!(
            "content exceeds Discord limit ({len}/{MAX_CONTENT})"
        )));
    }
    Ok(())
}

fn validate_embeds(embeds: Option<&Value>) -> Result<(), ValidationError> {
    let Some(embeds) = present(embeds) else {
        return Ok(());
    };
    let Value::Array(embeds) = embeds else {
        return Err(ValidationError::new("embeds must be a sequence"));
    };
    if embeds.len() > MAX_EMBEDS {
        return Err(ValidationError::new(format!(
            "Discord allows at most {MAX_EMBEDS} embeds ({}/{MAX_EMBEDS})",
            embeds.len()
        )));
    }
    for (index, embed) in embeds.iter().enumerate() {
        let Value::Object(embed) = embed else {
            return Err(ValidationError::new(format!(
                "embed at index {index} must be an object"
            )));
        };
        EmbedCheck::new(index, embed).run()?;
    }
    Ok(())
}

/// Limit checks for a single embed, tracking the aggregate character count.
struct EmbedCheck<'a> {
    index: usize,
    embed: &'a Map<String, Value>,
    total: usize,
}

impl<'a> EmbedCheck<'a> {
    fn new(index: usize, embed: &'a Map<String, Value>) -> Self {
        Self {
            index,
            embed,
            total: 0,
        }
    }

    fn run(mut self) -> Result<(), ValidationError> {
        self.text("title", self.embed.get("title"), MAX_TITLE)?;
        self.text("description", self.embed.get("description"), MAX_DESCRIPTION)?;

        if let Some(footer) = self.object("footer")? {
            self.text("footer.text", footer.get("text"), MAX_FOOTER)?;
        }
        if let Some(author) = self.object("author")? {
            self.text("author.name", author.get("name"), MAX_AUTHOR)?;
        }
        for key in MEDIA_KEYS {
            self.object(key)?;
        }

        self.fields()?;
        self.timestamp()?;

        if self.total > MAX_EMBED_TOTAL {
            return Err(self.error(format!(
                "embed[{}] exceeds the {MAX_EMBED_TOTAL} character aggregate limit ({}/{MAX_EMBED_TOTAL})",
                self.index, self.total
            )));
        }
        Ok(())
    }

    fn error(&self, message: String) -> ValidationError {
        ValidationError::new(message)
    }

    fn text(&mut self, key: &str, value: Option<&Value>, limit: usize) -> Result<(), ValidationError> {
        let Some(value) = present(value) else {
            return Ok(());
        };
        let Value::String(text) = value else {
            return Err(self.error(format!("embed[{}].{key} must be a string", self.index)));
        };
        let len = char_len(text);
        if len > limit {
            return Err(self.error(format!(
                "embed[{}].{key} exceeds maximum length ({len}/{limit})",
                self.index
            )));
        }
        self.total += len;
        Ok(())
    }

    fn object(&self, key: &str) -> Result<Option<&'a Map<String, Value>>, ValidationError> {
        match present(self.embed.get(key)) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(self.error(format!("embed[{}].{key} must be an object", self.index))),
        }
    }

    fn fields(&mut self) -> Result<(), ValidationError> {
        let Some(fields) = present(self.embed.get("fields")) else {
            return Ok(());
        };
        let Value::Array(fields) = fields else {
            return Err(self.error(format!(
                "embed[{}].fields must be a sequence of field objects",
                self.index
            )));
        };
        if fields.len() > MAX_FIELDS {
            return Err(self.error(format!(
                "embed[{}].fields exceeds Discord limit ({}/{MAX_FIELDS})",
                self.index,
                fields.len()
            )));
        }

        for (field_index, field) in fields.iter().enumerate() {
            let Value::Object(field) = field else {
                return Err(self.error(format!(
                    "embed[{}].fields[{field_index}] must be an object",
                    self.index
                )));
            };
            let name = present(field.get("name")).ok_or_else(|| {
                self.error(format!(
                    "embed[{}].fields[{field_index}].name is required",
                    self.index
                ))
            })?;
            let value = present(field.get("value")).ok_or_else(|| {
                self.error(format!(
                    "embed[{}].fields[{field_index}].value is required",
                    self.index
                ))
            })?;
            self.text(&format!("fields[{field_index}].name"), Some(name), MAX_FIELD_NAME)?;
            self.text(&format!("fields[{field_index}].value"), Some(value), MAX_FIELD_VALUE)?;

            if let Some(inline) = present(field.get("inline"))
                && !inline.is_boolean()
            {
                return Err(self.error(format!(
                    "embed[{}].fields[{field_index}].inline must be a boolean",
                    self.index
                )));
            }
        }
        Ok(())
    }

    fn timestamp(&self) -> Result<(), ValidationError> {
        let Some(raw) = present(self.embed.get("timestamp")) else {
            return Ok(());
        };
        let Value::String(raw) = raw else {
            return Err(self.error(format!("embed[{}].timestamp must be a string", self.index)));
        };
        if !is_iso8601(raw) {
            return Err(self.error(format!(
                "embed[{}].timestamp must be ISO 8601 formatted",
                self.index
            )));
        }
        Ok(())
    }
}

/// Whether `raw` is an ISO 8601 date or date-time.
///
/// Dates are calendar (`2024-05-01`, `20240501`) or week dates (`2024-W18-3`,
/// `2024W183`). A time follows a `T`, `t` or space and may be reduced to
/// hours or minutes, in extended or basic form, with a `.` or `,` fraction
/// after the seconds. The offset is `Z` or `±HH[[:]MM[[:]SS]]`.
fn is_iso8601(raw: &str) -> bool {
    if !raw.is_ascii() {
        return false;
    }
    match raw.split_once(['T', 't', ' ']) {
        Some((date, time)) => is_iso_date(date) && is_iso_time(time),
        None => is_iso_date(raw),
    }
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_iso_date(date: &str) -> bool {
    let Some((year, rest)) = date.split_at_checked(4) else {
        return false;
    };
    if !is_digits(year, 4) {
        return false;
    }
    let (extended, rest) = match rest.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };

    if let Some(week) = rest.strip_prefix('W') {
        let (week, day) = match (extended, week.split_once('-')) {
            (true, Some((week, day))) => (week, day),
            (true, None) => (week, "1"),
            (false, _) if week.len() == 3 => week.split_at(2),
            (false, _) => (week, "1"),
        };
        if !is_digits(week, 2) || !is_digits(day, 1) {
            return false;
        }
        let weekday = parse_number::<usize>(day)
            .checked_sub(1)
            .and_then(|index| WEEKDAYS.get(index).copied());
        return weekday.is_some_and(|weekday| {
            NaiveDate::from_isoywd_opt(parse_number(year), parse_number(week), weekday).is_some()
        });
    }

    let (month, day) = if extended {
        match rest.split_once('-') {
            Some(parts) => parts,
            None => return false,
        }
    } else {
        match rest.split_at_checked(2) {
            Some(parts) => parts,
            None => return false,
        }
    };
    is_digits(month, 2)
        && is_digits(day, 2)
        && NaiveDate::from_ymd_opt(parse_number(year), parse_number(month), parse_number(day))
            .is_some()
}

fn is_iso_time(time: &str) -> bool {
    match time.find(['Z', '+', '-']) {
        Some(index) => {
            let (clock, offset) = time.split_at(index);
            is_clock(clock, true) && (offset == "Z" || is_clock(&offset[1..], false))
        }
        None => is_clock(time, true),
    }
}

/// `HH[:MM[:SS[.f]]]` or `HH[MM[SS[.f]]]`; fractions only when `fraction`.
fn is_clock(clock: &str, fraction: bool) -> bool {
    let (main, frac) = match clock.split_once(['.', ',']) {
        Some((main, frac)) => (main, Some(frac)),
        None => (clock, None),
    };
    let parts: Vec<&str> = if main.contains(':') {
        main.split(':').collect()
    } else if main.len() % 2 == 0 {
        (0..main.len())
            .step_by(2)
            .map(|start| &main[start..start + 2])
            .collect()
    } else {
        return false;
    };
    if parts.is_empty() || parts.len() > 3 || !parts.iter().all(|part| is_digits(part, 2)) {
        return false;
    }
    if let Some(frac) = frac {
        let digits = !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit());
        if !fraction || parts.len() != 3 || !digits {
            return false;
        }
    }
    let [hour, rest @ ..] = parts.as_slice() else {
        return false;
    };
    parse_number::<u32>(hour) < 24 && rest.iter().all(|part| parse_number::<u32>(part) < 60)
}

/// Parse a string already checked to be ASCII digits.
fn parse_number<T: std::str::FromStr + Default>(digits: &str) -> T {
    digits.parse().unwrap_or_default()
}
