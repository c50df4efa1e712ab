//! `.env` loading and template-friendly key normalization.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, EnvMap};

/// Files checked for defaults when no search paths are given.
pub const DEFAULT_ENV_FILES: &[&str] = &[".env"];

/// Load environment values from `.env` files and the process environment.
///
/// Precedence, lowest to highest:
/// 1. the first existing file among `search_paths`
/// 2. `env_file`, which must exist when given
/// 3. the process environment
///
/// Relative paths are resolved against the current directory.
///
/// # Errors
///
/// Returns [`ConfigError::EnvFileNotFound`] if `env_file` does not exist and
/// [`ConfigError::Dotenv`] if a file cannot be parsed.
pub fn load_environment<P: AsRef<Path>>(
    env_file: Option<&Path>,
    search_paths: &[P],
) -> Result<EnvMap, ConfigError> {
    let mut merged = EnvMap::new();

    if let Some(found) = search_paths
        .iter()
        .map(|path| absolute(path.as_ref()))
        .find(|path| path.is_file())
    {
        debug!("Loading defaults from {}", found.display());
        merged.extend(read_env_file(&found)?);
    }

    if let Some(path) = env_file {
        let path = absolute(path);
        if !path.is_file() {
            return Err(ConfigError::EnvFileNotFound(path));
        }
        debug!("Loading environment file {}", path.display());
        merged.extend(read_env_file(&path)?);
    }

    merged.extend(
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?))),
    );

    Ok(merged)
}

/// Return a copy of `env` with every `Some` override applied.
#[must_use]
pub fn apply_overrides<K: AsRef<str>>(env: &EnvMap, overrides: &[(K, Option<String>)]) -> EnvMap {
    let mut merged = env.clone();
    for (key, value) in overrides {
        if let Some(value) = value {
            merged.insert(key.as_ref().to_owned(), value.clone());
        }
    }
    merged
}

/// Expose every key as-is, upper-cased, and upper-cased with `-` as `_`.
///
/// Templates can then use `{{ DISCORD_WEBHOOK_URL }}` whatever the spelling
/// in the `.env` file.
#[must_use]
pub fn normalize_env_keys(env: &EnvMap) -> EnvMap {
    let mut normalized = EnvMap::new();
    for (key, value) in env {
        let upper = key.to_uppercase();
        normalized.insert(key.clone(), value.clone());
        normalized.insert(upper.replace('-', "_"), value.clone());
        normalized.insert(upper, value.clone());
    }
    normalized
}

fn read_env_file(path: &Path) -> Result<EnvMap, ConfigError> {
    let to_error = |source| ConfigError::Dotenv {
        path: path.to_path_buf(),
        source,
    };
    dotenvy::from_path_iter(path)
        .map_err(to_error)?
        .map(|item| item.map_err(to_error))
        .collect()
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
