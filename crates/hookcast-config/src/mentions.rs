//! Mention policy parsing.

use serde_json::{Value, json};

use crate::ConfigError;

/// Mention kinds a webhook message may allow.
pub const MENTION_KINDS: &[&str] = &["everyone", "roles", "users"];

/// Parse a comma-separated list of mention kinds.
///
/// Blank input allows nothing. Empty items are skipped.
///
/// # Errors
///
/// Returns `ConfigError::Validation` listing every unknown kind.
pub fn parse_mention_kinds(raw: &str) -> Result<Vec<String>, ConfigError> {
    let kinds: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .map(str::to_owned)
        .collect();

    let invalid: Vec<&str> = kinds
        .iter()
        .map(String::as_str)
        .filter(|kind| !MENTION_KINDS.contains(kind))
        .collect();
    if !invalid.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid allowed mention values: {}",
            invalid.join(", ")
        )));
    }

    Ok(kinds)
}

/// Turn an `--allow-mentions` value into a mention policy object.
///
/// `None` means no override; blank input gives `{"parse": []}`.
///
/// # Errors
///
/// Returns `ConfigError::Validation` for unknown mention kinds.
pub fn parse_allowed_mentions(raw: Option<&str>) -> Result<Option<Value>, ConfigError> {
    raw.map(|raw| parse_mention_kinds(raw).map(|kinds| json!({ "parse": kinds })))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_none_is_no_override() {
        assert_eq!(parse_allowed_mentions(None).unwrap(), None);
    }

    #[test]
    fn test_blank_allows_nothing() {
        assert_eq!(
            parse_allowed_mentions(Some("   ")).unwrap(),
            Some(json!({"parse": []}))
        );
    }

    #[test]
    fn test_list_is_trimmed() {
        assert_eq!(
            parse_allowed_mentions(Some(" users , roles,,")).unwrap(),
            Some(json!({"parse": ["users", "roles"]}))
        );
    }

    #[test]
    fn test_unknown_kinds_listed() {
        let err = parse_allowed_mentions(Some("users,channels,here")).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid allowed mention values: channels, here"
        );
    }
}
