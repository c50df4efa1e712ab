//! Configuration management for hookcast.
//!
//! Parses `hookcast.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. Environment values
//! come from `.env` files layered under the process environment, see
//! [`load_environment`].
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support expansion against the loaded
//! environment:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `webhook.urls`
//! - `webhook.thread_id`

mod env;
mod expand;
mod mentions;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub use env::{DEFAULT_ENV_FILES, apply_overrides, load_environment, normalize_env_keys};
pub use mentions::{MENTION_KINDS, parse_allowed_mentions, parse_mention_kinds};

/// Environment values keyed by variable name.
pub type EnvMap = BTreeMap<String, String>;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-empty values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Replace the configured webhook URLs.
    pub webhooks: Vec<String>,
    /// Override thread id.
    pub thread_id: Option<String>,
    /// Override retry-on-rate-limit flag.
    pub retry: Option<bool>,
    /// Override URL redaction flag.
    pub redact: Option<bool>,
    /// Override suppress-embeds flag.
    pub suppress_embeds: Option<bool>,
    /// Override allowed mention kinds (comma-separated, may be blank).
    pub allowed_mentions: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "hookcast.toml";

/// Longest accepted request timeout.
const MAX_TIMEOUT_SECS: u64 = 300;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delivery targets.
    pub webhook: WebhookConfig,
    /// HTTP behaviour.
    pub delivery: DeliveryConfig,
    /// Message-level defaults.
    pub message: MessageConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Webhook targets.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook URLs, delivered in order.
    pub urls: Vec<String>,
    /// Thread to post into.
    pub thread_id: Option<String>,
}

/// Delivery configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Retry once after a rate-limit response.
    pub retry: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Mask webhook tokens in logs and errors.
    pub redact: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry: true,
            timeout_secs: 10,
            redact: true,
        }
    }
}

impl DeliveryConfig {
    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Message defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Mention kinds allowed to ping. `None` keeps the payload's own policy.
    pub allowed_mentions: Option<Vec<String>>,
    /// Hide link previews.
    pub suppress_embeds: bool,
}

impl MessageConfig {
    /// Mention policy object for the payload, if one is configured.
    #[must_use]
    pub fn mention_policy(&self) -> Option<serde_json::Value> {
        self.allowed_mentions
            .as_ref()
            .map(|kinds| serde_json::json!({ "parse": kinds }))
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Explicit `.env` file not found.
    #[error("Environment file {} does not exist", .0.display())]
    EnvFileNotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// `.env` parsing error.
    #[error("Failed to read {}: {source}", path.display())]
    Dotenv {
        /// File being read.
        path: PathBuf,
        /// Underlying parser error.
        source: dotenvy::Error,
    },
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`webhook.urls[0]`").
        field: String,
        /// Error message (e.g., "${`DISCORD_WEBHOOK_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `hookcast.toml` in current directory and
    /// parents. `env` supplies values for `${VAR}` expansion.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing or
    /// expansion fails, or the result is invalid.
    pub fn load(
        config_path: Option<&Path>,
        env: &EnvMap,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path, env)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered, env)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) -> Result<(), ConfigError> {
        if !settings.webhooks.is_empty() {
            self.webhook.urls.clone_from(&settings.webhooks);
        }
        if let Some(thread_id) = &settings.thread_id {
            self.webhook.thread_id = Some(thread_id.clone());
        }
        if let Some(retry) = settings.retry {
            self.delivery.retry = retry;
        }
        if let Some(redact) = settings.redact {
            self.delivery.redact = redact;
        }
        if let Some(suppress_embeds) = settings.suppress_embeds {
            self.message.suppress_embeds = suppress_embeds;
        }
        if let Some(raw) = &settings.allowed_mentions {
            self.message.allowed_mentions = Some(parse_mention_kinds(raw)?);
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path, env: &EnvMap) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars(env)?;
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_webhook()?;
        self.validate_delivery()?;
        self.validate_message()?;
        Ok(())
    }

    fn validate_webhook(&self) -> Result<(), ConfigError> {
        for (index, url) in self.webhook.urls.iter().enumerate() {
            let field = format!("webhook.urls[{index}]");
            require_non_empty(url, &field)?;
            require_http_url(url, &field)?;
        }
        if let Some(thread_id) = &self.webhook.thread_id {
            require_non_empty(thread_id, "webhook.thread_id")?;
        }
        Ok(())
    }

    fn validate_delivery(&self) -> Result<(), ConfigError> {
        let timeout = self.delivery.timeout_secs;
        if timeout == 0 || timeout > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "delivery.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        Ok(())
    }

    fn validate_message(&self) -> Result<(), ConfigError> {
        if let Some(kinds) = &self.message.allowed_mentions {
            parse_mention_kinds(&kinds.join(","))?;
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self, env: &EnvMap) -> Result<(), ConfigError> {
        for (index, url) in self.webhook.urls.iter_mut().enumerate() {
            *url = expand::expand_env(url, &format!("webhook.urls[{index}]"), env)?;
        }
        if let Some(ref thread_id) = self.webhook.thread_id {
            self.webhook.thread_id = Some(expand::expand_env(thread_id, "webhook.thread_id", env)?);
        }
        Ok(())
    }
}
