//! The single linear run: reuse, authorize, refresh, persist
//!
//! 1. Credential file present: reuse its ID token when valid for the
//!    audience, otherwise take its refresh token
//! 2. Credential file absent: print the consent URL, read the pasted code,
//!    exchange it for a refresh token
//! 3. Refresh for the audience, persist, return the new ID token

use std::io::{BufRead, Write};

use oidc_auth::{
    CredentialFile, Pkce, StoredCredential, build_authorization_url, exchange_code,
    refresh_id_token, unix_now,
};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// Produce an ID token for `config.audience`.
///
/// `input` supplies the authorization code on first run and `prompt`
/// receives the consent URL. A cached token that is still valid is
/// returned without touching the network.
pub async fn obtain_id_token<R, W>(
    config: &Config,
    http: &reqwest::Client,
    input: &mut R,
    prompt: &mut W,
) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    let file = CredentialFile::new(&config.credential_file);

    let refresh_token = if file.exists().await? {
        let cached = file.load().await?;
        if let Some(id_token) = cached.reusable_id_token(&config.audience, unix_now())? {
            info!(audience = %config.audience, "cached id_token still valid");
            return Ok(id_token.to_owned());
        }
        cached.refresh_token
    } else {
        info!(path = %file.path().display(), "no credential file, starting authorization");
        authorize(config, http, input, prompt).await?
    };

    if refresh_token.is_empty() {
        return Err(oidc_auth::Error::InvalidCredentials(format!(
            "{} has no refresh_token; delete it to authorize again",
            file.path().display()
        ))
        .into());
    }

    let response =
        refresh_id_token(http, &config.client, &refresh_token, &config.audience).await?;
    let credential = StoredCredential::from_response(response, &refresh_token, unix_now())?;
    file.save(&credential).await?;
    if credential.id_token.is_empty() {
        warn!(audience = %config.audience, "token endpoint returned no id_token");
    }
    info!(audience = %config.audience, expiry = ?credential.expiry, "refreshed id_token");
    Ok(credential.id_token)
}

/// First-run consent: returns the refresh token from the code exchange.
async fn authorize<R, W>(
    config: &Config,
    http: &reqwest::Client,
    input: &mut R,
    prompt: &mut W,
) -> Result<String>
where
    R: BufRead,
    W: Write,
{
    let pkce = Pkce::generate();
    let url = build_authorization_url(&config.client, &pkce.challenge)?;

    write!(
        prompt,
        "\nVisit the URL for the auth dialog and enter the authorization code\n\n\
         {url}\n\nEnter code: "
    )
    .and_then(|()| prompt.flush())
    .map_err(|e| Error::Prompt(format!("writing prompt: {e}")))?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .map_err(|e| Error::Prompt(format!("reading stdin: {e}")))?;
    let code = line.trim();
    if code.is_empty() {
        return Err(Error::Prompt("no authorization code entered".into()));
    }

    let token = exchange_code(http, &config.client, code, &pkce.verifier).await?;
    info!("authorization code exchanged");
    Ok(token.refresh_token)
}
