//! Render, validate and deliver one webhook message.

use std::path::{Path, PathBuf};

use clap::Args;
use hookcast_config::{
    CliSettings, Config, DEFAULT_ENV_FILES, EnvMap, apply_overrides, load_environment,
};
use hookcast_template::{
    TemplateContext, build_template_context, parse_var_assignments, render_template,
};
use hookcast_webhook::{
    Attachment, DeliveryOptions, DeliveryResult, Payload, Redactor, Transport, WebhookClient,
    ensure_unique_names, finalize_payload, prepare_attachments, split_attachments,
    validate_payload,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CliError;
use crate::output::Output;

/// Environment variable holding the default webhook URL.
const WEBHOOK_ENV_VAR: &str = "DISCORD_WEBHOOK_URL";

/// Arguments for sending a message.
#[derive(Args)]
pub(crate) struct SendArgs {
    /// Path to the Jinja template file.
    #[arg(long)]
    template: PathBuf,

    /// Message content available to the template as `message`.
    #[arg(long, default_value = "")]
    message: String,

    /// Prefix the message with @everyone.
    #[arg(long)]
    everyone: bool,

    /// Template variable assignment (repeatable).
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,

    /// Attachment to upload: PATH[::DESCRIPTION[::CONTENT_TYPE]] (repeatable).
    #[arg(long = "file", value_name = "SPEC")]
    files: Vec<String>,

    /// Attachment uploaded only if the payload references it via attachment:// (repeatable).
    #[arg(long = "embed-file", value_name = "SPEC")]
    embed_files: Vec<String>,

    /// Target webhook URL (repeatable). Defaults to config, then DISCORD_WEBHOOK_URL.
    #[arg(long = "webhook", value_name = "URL")]
    webhooks: Vec<String>,

    /// Path to a .env file with defaults.
    #[arg(long, value_name = "FILE")]
    env: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover hookcast.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Render and validate the payload, print it, and exit without sending.
    #[arg(long)]
    dry_run: bool,

    /// Do not retry after a rate-limit response.
    #[arg(long)]
    no_retry: bool,

    /// Post into a thread.
    #[arg(long)]
    thread_id: Option<String>,

    /// Hide link previews in the message.
    #[arg(long)]
    suppress_embeds: bool,

    /// Comma-separated mention kinds allowed to ping (everyone,roles,users).
    #[arg(long, value_name = "LIST")]
    allow_mentions: Option<String>,

    /// Show webhook URLs in full in logs and errors.
    #[arg(long)]
    no_redact: bool,
}

/// A validated message ready for delivery.
pub(crate) struct PreparedMessage {
    payload: Payload,
    attachments: Vec<Attachment>,
    env: EnvMap,
    config: Config,
}

impl SendArgs {
    /// Execute the send command.
    ///
    /// # Errors
    ///
    /// Returns an error if any step from loading the environment to delivery
    /// fails.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let message = self.prepare()?;

        if self.dry_run {
            return print_dry_run(output, &message);
        }

        let webhooks = message.webhooks()?;
        let client = WebhookClient::new(message.delivery_options());
        let results = deliver(&client, &webhooks, &message)?;
        print_results(output, &results, client.options().redact);
        Ok(())
    }

    /// Run everything up to and including validation.
    fn prepare(&self) -> Result<PreparedMessage, CliError> {
        let env_file = self.env.as_deref().map(expand_path);
        let env = load_environment(env_file.as_deref(), DEFAULT_ENV_FILES)?;

        let settings = CliSettings {
            webhooks: self.webhooks.clone(),
            thread_id: self.thread_id.clone(),
            retry: self.no_retry.then_some(false),
            redact: self.no_redact.then_some(false),
            suppress_embeds: self.suppress_embeds.then_some(true),
            allowed_mentions: self.allow_mentions.clone(),
        };
        let config_path = self.config.as_deref().map(expand_path);
        let config = Config::load(config_path.as_deref(), &env, Some(&settings))?;

        let vars = parse_var_assignments(&self.vars)?;
        let env = apply_overrides(&env, &[(WEBHOOK_ENV_VAR, self.webhooks.first().cloned())]);
        let collisions: Vec<&str> = vars
            .keys()
            .filter(|key| env.contains_key(*key))
            .map(String::as_str)
            .collect();
        if !collisions.is_empty() {
            debug!(
                "Template variables override environment defaults for: {}",
                collisions.join(", ")
            );
        }

        let has_attachments = !self.files.is_empty() || !self.embed_files.is_empty();
        let extra =
            TemplateContext::from([("has_attachments".to_owned(), Value::Bool(has_attachments))]);
        let context = build_template_context(&self.message, self.everyone, &env, &vars, extra);

        let template = expand_path(&self.template);
        info!("Rendering template {}", template.display());
        let rendered = render_template(&template, &context)?;

        let payload = finalize_payload(
            &rendered,
            config.message.mention_policy().as_ref(),
            config.message.suppress_embeds,
        );

        let mut attachments = prepare_attachments(&self.files, false)?;
        attachments.extend(prepare_attachments(&self.embed_files, true)?);
        ensure_unique_names(&attachments)?;

        let (used, unused) = split_attachments(&payload, &attachments);
        for attachment in &unused {
            warn!(
                "Skipping embed file '{}': not referenced by the payload",
                attachment.name()
            );
        }

        validate_payload(&payload, &used)?;

        Ok(PreparedMessage {
            payload,
            attachments: used,
            env,
            config,
        })
    }
}

impl PreparedMessage {
    /// Target URLs: CLI or config first, then `DISCORD_WEBHOOK_URL`.
    fn webhooks(&self) -> Result<Vec<String>, CliError> {
        if !self.config.webhook.urls.is_empty() {
            return Ok(self.config.webhook.urls.clone());
        }
        match self.env.get(WEBHOOK_ENV_VAR) {
            Some(url) if !url.trim().is_empty() => Ok(vec![url.clone()]),
            _ => Err(CliError::Usage(
                "Webhook URL not provided. Use --webhook, set [webhook] urls in hookcast.toml, \
                 or set DISCORD_WEBHOOK_URL in the environment."
                    .to_owned(),
            )),
        }
    }

    fn delivery_options(&self) -> DeliveryOptions {
        DeliveryOptions {
            retry: self.config.delivery.retry,
            thread_id: self.config.webhook.thread_id.clone(),
            timeout: self.config.delivery.timeout(),
            redact: self.config.delivery.redact,
        }
    }
}

fn deliver<T: Transport>(
    client: &WebhookClient<T>,
    webhooks: &[String],
    message: &PreparedMessage,
) -> Result<Vec<DeliveryResult>, CliError> {
    Ok(client.deliver(webhooks, &message.payload, &message.attachments)?)
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

fn print_dry_run(output: &Output, message: &PreparedMessage) -> Result<(), CliError> {
    output.highlight("[DRY RUN] Payload not sent.");
    output.data(&serde_json::to_string_pretty(&message.payload)?)?;

    if !message.attachments.is_empty() {
        output.info(&format!("\nAttachments ({}):", message.attachments.len()));
        for attachment in &message.attachments {
            output.info(&format!(
                "  -> {} ({}, {})",
                attachment.name(),
                attachment.content_type(),
                attachment.path().display()
            ));
        }
    }
    Ok(())
}

fn print_results(output: &Output, results: &[DeliveryResult], redact: bool) {
    let redactor = Redactor::new(redact);
    for result in results {
        output.success(&format!(
            "Webhook delivered to {} ({})",
            redactor.redact(&result.url),
            result.status
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::Parser;
    use hookcast_template::TemplateError;
    use hookcast_webhook::{MockTransport, WebhookResponse};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const HOOK: &str = "https://discord.com/api/webhooks/42/token";

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(template: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("message.json.j2"), template).unwrap();
            std::fs::write(dir.path().join("hookcast.toml"), "").unwrap();
            std::fs::write(dir.path().join("test.env"), "service_name=billing\n").unwrap();
            Self { dir }
        }

        fn file(&self, name: &str, content: &str) -> String {
            let path = self.dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path.display().to_string()
        }

        fn args(&self, extra: &[&str]) -> SendArgs {
            let path = |name: &str| self.dir.path().join(name).display().to_string();
            let mut argv = vec![
                "hookcast".to_owned(),
                "--template".to_owned(),
                path("message.json.j2"),
                "--config".to_owned(),
                path("hookcast.toml"),
                "--env".to_owned(),
                path("test.env"),
            ];
            argv.extend(extra.iter().map(|arg| (*arg).to_owned()));
            Cli::try_parse_from(argv).unwrap().send
        }
    }

    #[test]
    fn test_prepare_renders_context() {
        let fixture = Fixture::new(
            r#"{"content": "{{ message_prefix }}{{ message }} ({{ SERVICE_NAME }}, {{ build }})"}"#,
        );
        let args = fixture.args(&["--message", "Deployed", "--everyone", "--var", "build=17"]);

        let message = args.prepare().unwrap();

        assert_eq!(
            Value::Object(message.payload),
            json!({
                "content": "@everyone, Deployed (billing, 17)",
                "allowed_mentions": {"parse": []}
            })
        );
    }

    #[test]
    fn test_prepare_applies_message_flags() {
        let fixture = Fixture::new(r#"{"content": "hi"}"#);
        let args = fixture.args(&["--suppress-embeds", "--allow-mentions", "users"]);

        let message = args.prepare().unwrap();

        assert_eq!(message.payload["flags"], json!(4));
        assert_eq!(message.payload["allowed_mentions"], json!({"parse": ["users"]}));
    }

    #[test]
    fn test_prepare_drops_unreferenced_embed_files() {
        let fixture = Fixture::new(
            r#"{"embeds": [{"image": {"url": "attachment://chart.png"}}], "has_files": {{ has_attachments | tojson }}}"#,
        );
        let chart = fixture.file("chart.png", "png");
        let unused = fixture.file("unused.png", "png");
        let report = fixture.file("report.txt", "text");
        let args = fixture.args(&[
            "--embed-file",
            &chart,
            "--embed-file",
            &unused,
            "--file",
            &report,
        ]);

        let message = args.prepare().unwrap();

        let names: Vec<&str> = message.attachments.iter().map(Attachment::name).collect();
        assert_eq!(names, vec!["report.txt", "chart.png"]);
        assert_eq!(message.payload["has_files"], json!(true));
    }

    #[test]
    fn test_prepare_validation_error() {
        let fixture = Fixture::new(r#"{"content": "{{ message }}"}"#);
        let long = "x".repeat(2001);
        let args = fixture.args(&["--message", &long]);

        let err = args.prepare().err().unwrap();

        assert!(matches!(err, CliError::Validation(_)));
        assert_eq!(err.exit_code(), crate::error::EXIT_VALIDATION);
    }

    #[test]
    fn test_prepare_template_error() {
        let fixture = Fixture::new(r#"{"content": {{ message }}}"#);
        let args = fixture.args(&["--message", "not quoted"]);

        let err = args.prepare().err().unwrap();

        assert_eq!(err.exit_code(), crate::error::EXIT_TEMPLATE_ERROR);
    }

    #[test]
    fn test_prepare_missing_template() {
        let fixture = Fixture::new(r#"{"content": "x"}"#);
        let mut args = fixture.args(&[]);
        args.template = fixture.dir.path().join("absent.json.j2");

        let err = args.prepare().err().unwrap();

        assert!(matches!(err, CliError::Template(TemplateError::NotFound(_))));
        assert_eq!(err.exit_code(), crate::error::EXIT_VALIDATION);
    }

    #[test]
    fn test_prepare_invalid_var() {
        let fixture = Fixture::new(r#"{"content": "x"}"#);
        let args = fixture.args(&["--var", "novalue"]);

        let err = args.prepare().err().unwrap();

        assert_eq!(err.exit_code(), crate::error::EXIT_TEMPLATE_ERROR);
    }

    #[test]
    fn test_prepare_invalid_mentions() {
        let fixture = Fixture::new(r#"{"content": "x"}"#);
        let args = fixture.args(&["--allow-mentions", "channels"]);

        let err = args.prepare().err().unwrap();

        assert_eq!(err.exit_code(), crate::error::EXIT_VALIDATION);
    }

    #[test]
    fn test_cli_webhook_is_used_and_exposed_to_template() {
        let fixture = Fixture::new(r#"{"content": "{{ DISCORD_WEBHOOK_URL }}"}"#);
        let args = fixture.args(&["--webhook", HOOK]);

        let message = args.prepare().unwrap();

        assert_eq!(message.webhooks().unwrap(), vec![HOOK]);
        assert_eq!(message.payload["content"], HOOK);
    }

    #[test]
    fn test_webhook_falls_back_to_environment() {
        let message = PreparedMessage {
            payload: Payload::new(),
            attachments: Vec::new(),
            env: EnvMap::from([(WEBHOOK_ENV_VAR.to_owned(), HOOK.to_owned())]),
            config: Config::default(),
        };

        assert_eq!(message.webhooks().unwrap(), vec![HOOK]);
    }

    #[test]
    fn test_missing_webhook_is_usage_error() {
        let message = PreparedMessage {
            payload: Payload::new(),
            attachments: Vec::new(),
            env: EnvMap::new(),
            config: Config::default(),
        };

        let err = message.webhooks().unwrap_err();

        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn test_delivery_options_from_flags() {
        let fixture = Fixture::new(r#"{"content": "x"}"#);
        let args = fixture.args(&["--no-retry", "--no-redact", "--thread-id", "77"]);

        let options = args.prepare().unwrap().delivery_options();

        assert!(!options.retry);
        assert!(!options.redact);
        assert_eq!(options.thread_id.as_deref(), Some("77"));
    }

    #[test]
    fn test_deliver_with_attachment() {
        let fixture = Fixture::new(r#"{"content": "{{ message }}"}"#);
        let report = fixture.file("report.txt", "numbers");
        let args = fixture.args(&["--message", "Nightly", "--file", &report]);
        let message = args.prepare().unwrap();
        let transport = MockTransport::new().with_response(WebhookResponse::new(204, ""));
        let client = WebhookClient::with_transport(&transport, message.delivery_options());

        let results = deliver(&client, &[HOOK.to_owned()], &message).unwrap();

        assert_eq!(results[0].status, 204);
        let body = transport.requests()[0].body_text();
        assert!(body.contains("filename=\"report.txt\""));
        assert!(body.contains("Nightly"));
    }

    #[test]
    fn test_rate_limit_exhausted_exit_code() {
        let fixture = Fixture::new(r#"{"content": "x"}"#);
        let message = fixture.args(&["--no-retry"]).prepare().unwrap();
        let transport = MockTransport::new().with_response(WebhookResponse::new(429, "{}"));
        let client = WebhookClient::with_transport(&transport, message.delivery_options());

        let err = deliver(&client, &[HOOK.to_owned()], &message).unwrap_err();

        assert_eq!(err.exit_code(), crate::error::EXIT_RATE_LIMIT);
    }

    #[test]
    fn test_http_error_exit_code() {
        let fixture = Fixture::new(r#"{"content": "x"}"#);
        let message = fixture.args(&[]).prepare().unwrap();
        let transport = MockTransport::new().with_response(WebhookResponse::new(404, "{}"));
        let client = WebhookClient::with_transport(&transport, message.delivery_options());

        let err = deliver(&client, &[HOOK.to_owned()], &message).unwrap_err();

        assert_eq!(err.exit_code(), crate::error::EXIT_HTTP_ERROR);
        assert!(!err.to_string().contains("token"));
    }
}
