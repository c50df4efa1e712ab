//! Cross-cutting payload fields applied before validation.

use serde_json::{Value, json};
use tracing::warn;

use crate::Payload;
use crate::limits::SUPPRESS_EMBEDS_FLAG;

/// Apply the mention policy and suppress-embeds flag to a payload.
///
/// Returns a new payload; the input is left untouched.
///
/// - `allowed_mentions` replaces the payload's policy when given. Otherwise a
///   policy that pings nobody (`{"parse": []}`) is added if none is present.
/// - `suppress_embeds` sets bit 2 of `flags`, keeping any existing bits.
#[must_use]
pub fn finalize_payload(
    payload: &Payload,
    allowed_mentions: Option<&Value>,
    suppress_embeds: bool,
) -> Payload {
    let mut result = payload.clone();

    match allowed_mentions {
        Some(policy) => {
            result.insert("allowed_mentions".to_owned(), policy.clone());
        }
        None => {
            result
                .entry("allowed_mentions")
                .or_insert_with(|| json!({ "parse": [] }));
        }
    }

    if suppress_embeds {
        let flags = result.get("flags").map_or(0, flags_as_integer);
        result.insert("flags".to_owned(), Value::from(flags | SUPPRESS_EMBEDS_FLAG));
    }

    result
}

/// Read an existing `flags` value as an integer.
///
/// Numeric strings are accepted since templates often render numbers quoted.
/// Anything else counts as no flags.
fn flags_as_integer(value: &Value) -> i64 {
    let flags = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Null => Some(0),
        Value::Array(_) | Value::Object(_) => None,
    };
    flags.unwrap_or_else(|| {
        warn!("Ignoring non-integer flags value: {value}");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Payload {
        let Value::Object(map) = json!({
            "content": "hello",
            "embeds": [{"title": "Sample", "description": "World"}]
        }) else {
            unreachable!()
        };
        map
    }

    #[test]
    fn test_sets_defaults() {
        let result = finalize_payload(&sample(), None, true);

        assert_eq!(result["allowed_mentions"], json!({"parse": []}));
        assert_eq!(result["flags"].as_i64().unwrap() & 4, 4);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let payload = sample();
        let before = payload.clone();

        let _ = finalize_payload(&payload, Some(&json!({"parse": ["users"]})), true);

        assert_eq!(payload, before);
    }

    #[test]
    fn test_keeps_existing_policy_when_none_given() {
        let mut payload = sample();
        payload.insert("allowed_mentions".to_owned(), json!({"parse": ["roles"]}));

        let result = finalize_payload(&payload, None, false);

        assert_eq!(result["allowed_mentions"], json!({"parse": ["roles"]}));
        assert!(!result.contains_key("flags"));
    }

    #[test]
    fn test_explicit_policy_replaces_existing() {
        let mut payload = sample();
        payload.insert("allowed_mentions".to_owned(), json!({"parse": ["roles"]}));

        let result = finalize_payload(&payload, Some(&json!({"parse": ["everyone"]})), false);

        assert_eq!(result["allowed_mentions"], json!({"parse": ["everyone"]}));
    }

    #[test]
    fn test_suppress_embeds_keeps_existing_flags() {
        let mut payload = sample();
        payload.insert("flags".to_owned(), json!(4096));

        let result = finalize_payload(&payload, None, true);

        assert_eq!(result["flags"], json!(4096 | 4));
    }

    #[test]
    fn test_suppress_embeds_is_idempotent() {
        let mut payload = sample();
        payload.insert("flags".to_owned(), json!(4));

        let result = finalize_payload(&payload, None, true);

        assert_eq!(result["flags"], json!(4));
    }

    #[test]
    fn test_quoted_flags() {
        let mut payload = sample();
        payload.insert("flags".to_owned(), json!("1"));

        let result = finalize_payload(&payload, None, true);

        assert_eq!(result["flags"], json!(5));
    }
}
