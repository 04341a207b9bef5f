//! OAuth token endpoint calls
//!
//! Two interactions, both form-encoded POSTs to `ClientConfig::token_uri`:
//! 1. Authorization code exchange (first run only)
//! 2. Refresh-token grant carrying the requested `audience`
//!
//! Response bodies are read through `read_capped`, never past
//! `MAX_RESPONSE_BYTES`.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::claims::IdTokenClaims;
use crate::client::ClientConfig;
use crate::constants::MAX_RESPONSE_BYTES;
use crate::error::{Error, Result};

/// Success body from the token endpoint.
///
/// Fields a provider leaves out deserialize as empty/zero. Anything not
/// named here lands in `extra` and is carried into the persisted record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub id_token: String,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenResponse {
    /// Absolute expiry in unix seconds.
    ///
    /// Starts from `now + expires_in` when `expires_in` is positive; a
    /// returned `id_token` replaces that with its own `exp` claim. Fails if
    /// the `id_token` cannot be decoded.
    pub fn expiry(&self, now: i64) -> Result<Option<i64>> {
        let mut expiry = (self.expires_in > 0).then(|| now.saturating_add(self.expires_in));
        if !self.id_token.is_empty() {
            let claims = IdTokenClaims::decode_unverified(&self.id_token)?;
            if claims.exp.is_some() {
                expiry = claims.exp;
            }
        }
        Ok(expiry)
    }
}

/// Exchange an authorization code (plus PKCE verifier) for the initial
/// token pair. The response must carry a refresh token, since that is
/// what every later run spends.
pub async fn exchange_code(
    http: &reqwest::Client,
    client: &ClientConfig,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    debug!(token_uri = %client.token_uri, "exchanging authorization code");
    let response = http
        .post(&client.token_uri)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", client.redirect_uri.as_str()),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.expose().as_str()),
            ("code_verifier", verifier),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

    let status = response.status();
    let body = read_capped(response).await?;
    if !status.is_success() {
        return Err(Error::TokenExchange(format!(
            "token endpoint returned {status}: {}",
            String::from_utf8_lossy(&body)
        )));
    }

    let token: TokenResponse = serde_json::from_slice(&body)
        .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))?;
    if token.access_token.is_empty() {
        return Err(Error::TokenExchange(
            "token response missing access_token".into(),
        ));
    }
    if token.refresh_token.is_empty() {
        return Err(Error::TokenExchange(
            "token response missing refresh_token; revoke the app grant and authorize again".into(),
        ));
    }
    Ok(token)
}

/// Trade a refresh token for a fresh ID token scoped to `audience`.
///
/// Only `200 OK` counts as success. Any other status fails with the
/// response body included verbatim.
pub async fn refresh_id_token(
    http: &reqwest::Client,
    client: &ClientConfig,
    refresh_token: &str,
    audience: &str,
) -> Result<TokenResponse> {
    debug!(token_uri = %client.token_uri, audience, "refreshing id token");
    let response = http
        .post(&client.token_uri)
        .form(&[
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.expose().as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
            ("audience", audience),
        ])
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    let body = read_capped(response).await?;
    if status != StatusCode::OK {
        let body = String::from_utf8_lossy(&body);

        // 401/403 means the refresh token is revoked or invalid
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::InvalidCredentials(format!(
                "refresh token rejected ({status}): {body}"
            )));
        }

        return Err(Error::TokenExchange(format!(
            "token refresh returned {status}: {body}"
        )));
    }

    serde_json::from_slice(&body)
        .map_err(|e| Error::TokenExchange(format!("invalid refresh response: {e}")))
}

/// Buffer a response body, keeping at most `MAX_RESPONSE_BYTES`.
async fn read_capped(mut response: reqwest::Response) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::Http(format!("reading token response: {e}")))?
    {
        let remaining = MAX_RESPONSE_BYTES - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
