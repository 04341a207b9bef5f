//! OIDC ID-token CLI
//!
//! Prints an ID token for `--audience` on stdout:
//! 1. Reuses the cached ID token while it is valid for the audience
//! 2. Otherwise refreshes it with the cached refresh token
//! 3. On first run, walks the user through the consent URL to get one
//!
//! Logs and prompts go to stderr so stdout carries only the token.

mod config;
mod error;
mod flow;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Cli, Config};
use crate::error::{Error, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(&cli).await {
        Ok(id_token) => {
            println!("{id_token}");
            ExitCode::SUCCESS
        }
        Err(e) => report_failure(&e),
    }
}

/// Log the failure, echo it on stderr and map it to the process exit code.
fn report_failure(e: &Error) -> ExitCode {
    error!(error = ?e, exit_code = e.exit_code(), "run failed");
    eprintln!("oidc-token: {e}");
    ExitCode::from(e.exit_code())
}

async fn run(cli: &Cli) -> Result<String> {
    let config = Config::load(cli)?;
    info!(
        credential_file = %config.credential_file.display(),
        audience = %config.audience,
        token_uri = %config.client.token_uri,
        "configuration loaded"
    );

    let http = reqwest::Client::new();
    let mut stdin = std::io::stdin().lock();
    let mut stderr = std::io::stderr();
    flow::obtain_id_token(&config, &http, &mut stdin, &mut stderr).await
}

/// Stderr logging filtered by `LOG_LEVEL`, then `RUST_LOG`, default `warn`.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
