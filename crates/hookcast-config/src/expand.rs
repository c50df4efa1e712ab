//! `${VAR}` expansion of configuration strings.

use crate::{ConfigError, EnvMap};

/// Expand `${VAR}` and `${VAR:-default}` references using `env`.
///
/// Unset variables without a default are an error naming `field`.
pub(crate) fn expand_env(input: &str, field: &str, env: &EnvMap) -> Result<String, ConfigError> {
    shellexpand::env_with_context(input, |name| {
        env.get(name)
            .map(|value| Some(value.as_str()))
            .ok_or("not set")
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|err| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} {}", err.var_name, err.cause),
    })
}
