//! Functions for building embed objects inside templates.
//!
//! ```jinja
//! "footer": {{ embed_footer("Build #" ~ build, icon_url=icon) | tojson }},
//! "fields": [{{ embed_field("Status", status, inline=true) | tojson }}],
//! "timestamp": {{ embed_timestamp() | tojson }}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use minijinja::value::{Kwargs, Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};
use serde_json::{Map, json};

/// Register the embed helpers on an environment.
pub(crate) fn register(env: &mut Environment<'_>) {
    env.add_function("embed_footer", embed_footer);
    env.add_function("embed_field", embed_field);
    env.add_function("embed_timestamp", embed_timestamp);
}

/// `embed_footer(text, icon_url=None, proxy_icon_url=None)`
fn embed_footer(text: &Value, kwargs: Kwargs) -> Result<Value, Error> {
    let icon_url: Option<&str> = kwargs.get("icon_url")?;
    let proxy_icon_url: Option<&str> = kwargs.get("proxy_icon_url")?;
    kwargs.assert_all_used()?;

    let mut footer = Map::new();
    footer.insert("text".to_owned(), json!(text.to_string()));
    if let Some(url) = icon_url.filter(|url| !url.is_empty()) {
        footer.insert("icon_url".to_owned(), json!(url));
    }
    if let Some(url) = proxy_icon_url.filter(|url| !url.is_empty()) {
        footer.insert("proxy_icon_url".to_owned(), json!(url));
    }
    Ok(Value::from_serialize(&footer))
}

/// `embed_field(name, value, inline=False)`
fn embed_field(
    name: &Value,
    value: &Value,
    inline: Option<&Value>,
    kwargs: Kwargs,
) -> Result<Value, Error> {
    let inline_kwarg: Option<&Value> = kwargs.get("inline")?;
    kwargs.assert_all_used()?;
    let inline = inline.or(inline_kwarg).is_some_and(Value::is_true);

    Ok(Value::from_serialize(json!({
        "name": name.to_string(),
        "value": value.to_string(),
        "inline": inline,
    })))
}

/// `embed_timestamp(value=None)`
///
/// No value gives the current time; numbers are Unix seconds; strings pass
/// through unchanged.
fn embed_timestamp(value: Option<&Value>) -> Result<String, Error> {
    let Some(value) = value else {
        return Ok(format_utc(Utc::now()));
    };
    match value.kind() {
        ValueKind::String => Ok(value.to_string()),
        ValueKind::Number => {
            let seconds = f64::try_from(value.clone())?;
            from_unix_seconds(seconds)
                .map(format_utc)
                .ok_or_else(|| {
                    Error::new(
                        ErrorKind::InvalidOperation,
                        format!("embed_timestamp value {seconds} is out of range"),
                    )
                })
        }
        _ => Err(Error::new(
            ErrorKind::InvalidOperation,
            "embed_timestamp requires a timestamp or ISO string",
        )),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_unix_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

fn format_utc(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
