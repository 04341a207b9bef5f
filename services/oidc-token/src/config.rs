//! Command-line flags and the resolved runtime configuration
//!
//! Precedence: CLI flag > environment variable > default. The client
//! secret itself only ever comes from the client secrets file.

use std::path::{Path, PathBuf};

use clap::Parser;
use oidc_auth::{ClientConfig, DEFAULT_CREDENTIAL_FILE};

/// Print an OIDC ID token for an audience, refreshing a cached credential
/// when needed.
#[derive(Debug, Parser)]
#[command(name = "oidc-token", version)]
pub struct Cli {
    /// Credential cache file (holds the refresh token).
    #[arg(
        long = "credential_file",
        env = "OIDC_CREDENTIAL_FILE",
        default_value = DEFAULT_CREDENTIAL_FILE
    )]
    pub credential_file: PathBuf,

    /// OAuth client secrets JSON for an installed (desktop) application.
    #[arg(long = "client_secrets_file", env = "OIDC_CLIENT_SECRETS_FILE")]
    pub client_secrets_file: PathBuf,

    /// Audience requested in the refresh grant and checked on the cached token.
    #[arg(long, env = "OIDC_AUDIENCE")]
    pub audience: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long = "json_logs", default_value_t = false)]
    pub json_logs: bool,
}

/// Immutable configuration shared by every stage of a run.
#[derive(Debug)]
pub struct Config {
    pub credential_file: PathBuf,
    pub audience: String,
    pub client: ClientConfig,
}

impl Config {
    /// Validate flags and load the client secrets file.
    pub fn load(cli: &Cli) -> common::Result<Self> {
        Self::from_parts(&cli.credential_file, &cli.client_secrets_file, &cli.audience)
    }

    fn from_parts(
        credential_file: &Path,
        client_secrets_file: &Path,
        audience: &str,
    ) -> common::Result<Self> {
        if audience.trim().is_empty() {
            return Err(common::Error::Config("--audience must be set".into()));
        }
        if client_secrets_file.as_os_str().is_empty() {
            return Err(common::Error::Config(
                "--client_secrets_file must be set".into(),
            ));
        }
        if credential_file.as_os_str().is_empty() {
            return Err(common::Error::Config(
                "--credential_file must not be empty".into(),
            ));
        }

        let client = ClientConfig::load(client_secrets_file).map_err(|e| {
            common::Error::Config(format!(
                "unable to load client secrets from {}: {e}",
                client_secrets_file.display()
            ))
        })?;

        Ok(Self {
            credential_file: credential_file.to_path_buf(),
            audience: audience.to_owned(),
            client,
        })
    }
}
