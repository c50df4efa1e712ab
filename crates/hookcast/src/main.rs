//! hookcast CLI - templated webhook messages.
//!
//! Renders a Jinja template into a webhook payload, validates it against
//! Discord's limits and posts it (with optional file attachments) to one or
//! more webhooks.
//!
//! Exit codes: 0 on success, 1 for I/O failures, 2 for invalid input,
//! configuration or a missing template, 3 for a failed request, 4 when still
//! rate limited after the retry, 5 for template errors.

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::SendArgs;
use output::Output;

/// hookcast - send templated webhook messages.
#[derive(Parser)]
#[command(name = "hookcast", version, about)]
struct Cli {
    #[command(flatten)]
    send: SendArgs,

    /// Enable debug logging.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    verbose_json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // Flags win over RUST_LOG; info when neither is given
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.verbose_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.send.execute(&output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::from(err.exit_code())
        }
    }
}
