//! Template variables.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use hookcast_config::{EnvMap, normalize_env_keys};
use serde_json::Value;

use crate::error::TemplateError;

/// Variables visible to a template.
pub type TemplateContext = BTreeMap<String, Value>;

/// Parse `key=value` assignments.
///
/// Splits on the first `=`; keys are trimmed, values kept verbatim. Later
/// assignments win.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidAssignment`] for items without `=` and
/// [`TemplateError::EmptyVariableName`] for blank keys.
pub fn parse_var_assignments<S: AsRef<str>>(
    items: &[S],
) -> Result<BTreeMap<String, String>, TemplateError> {
    let mut assignments = BTreeMap::new();
    for item in items {
        let item = item.as_ref();
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| TemplateError::InvalidAssignment(item.to_owned()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(TemplateError::EmptyVariableName);
        }
        assignments.insert(key.to_owned(), value.to_owned());
    }
    Ok(assignments)
}

/// Assemble the rendering context.
///
/// Layers, lowest to highest: normalized environment keys, `overrides`, the
/// built-in variables (`message`, `message_prefix`, `now_iso`), then `extra`.
#[must_use]
pub fn build_template_context(
    message: &str,
    include_everyone: bool,
    env_values: &EnvMap,
    overrides: &BTreeMap<String, String>,
    extra: TemplateContext,
) -> TemplateContext {
    let mut context: TemplateContext = normalize_env_keys(env_values)
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    context.extend(
        overrides
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone()))),
    );

    let prefix = if include_everyone { "@everyone, " } else { "" };
    context.insert("message".to_owned(), Value::from(message));
    context.insert("message_prefix".to_owned(), Value::from(prefix));
    context.insert(
        "now_iso".to_owned(),
        Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)),
    );

    context.extend(extra);
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_var_assignments() {
        let vars = parse_var_assignments(&[" title =Release", "url=https://x/?a=b", "empty="]).unwrap();

        assert_eq!(vars["title"], "Release");
        assert_eq!(vars["url"], "https://x/?a=b");
        assert_eq!(vars["empty"], "");
    }

    #[test]
    fn test_parse_var_without_equals() {
        let err = parse_var_assignments(&["novalue"]).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid --var assignment 'novalue'. Use key=value."
        );
    }

    #[test]
    fn test_parse_var_empty_key() {
        let err = parse_var_assignments(&["  =x"]).unwrap_err();

        assert!(matches!(err, TemplateError::EmptyVariableName));
    }

    #[test]
    fn test_context_layers() {
        let env = EnvMap::from([
            ("service-name".to_owned(), "api".to_owned()),
            ("message".to_owned(), "from env".to_owned()),
        ]);
        let overrides = BTreeMap::from([("SERVICE_NAME".to_owned(), "web".to_owned())]);
        let extra = TemplateContext::from([("has_attachments".to_owned(), Value::Bool(true))]);

        let context = build_template_context("Deployed", true, &env, &overrides, extra);

        assert_eq!(context["service-name"], "api");
        assert_eq!(context["SERVICE-NAME"], "api");
        assert_eq!(context["SERVICE_NAME"], "web");
        assert_eq!(context["message"], "Deployed");
        assert_eq!(context["message_prefix"], "@everyone, ");
        assert_eq!(context["has_attachments"], true);
        assert!(context["now_iso"].as_str().unwrap().ends_with("+00:00"));
    }

    #[test]
    fn test_no_everyone_prefix() {
        let context = build_template_context(
            "",
            false,
            &EnvMap::new(),
            &BTreeMap::new(),
            TemplateContext::new(),
        );

        assert_eq!(context["message_prefix"], "");
    }
}
