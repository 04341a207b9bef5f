//! Authorization URL and PKCE (RFC 7636) for the first-run consent flow
//!
//! The verifier stays in memory for the single invocation that prints the
//! URL and then exchanges the pasted code; only the S256 challenge goes
//! into the URL.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};
use url::Url;

use crate::client::ClientConfig;
use crate::constants::{AUTHORIZATION_STATE, USERINFO_EMAIL_SCOPE};
use crate::error::{Error, Result};

/// Verifier/challenge pair for one authorization attempt.
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        let verifier = generate_verifier();
        let challenge = compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Random code verifier: 32 bytes as URL-safe base64 without padding,
/// which yields 43 characters (the RFC minimum length).
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// `challenge = BASE64URL(SHA256(verifier))`
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Build the consent URL the user opens in a browser.
pub fn build_authorization_url(client: &ClientConfig, challenge: &str) -> Result<String> {
    let url = Url::parse_with_params(
        &client.auth_uri,
        &[
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", client.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", USERINFO_EMAIL_SCOPE),
            ("state", AUTHORIZATION_STATE),
            ("code_challenge", challenge),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|e| {
        Error::ClientSecrets(format!(
            "auth_uri {:?} is not a valid URL: {e}",
            client.auth_uri
        ))
    })?;
    Ok(url.into())
}
