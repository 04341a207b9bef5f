//! On-disk credential cache
//!
//! One JSON object per file holding the last token response plus the
//! refresh token that produced it. Writes go through a temp file and a
//! rename, and the result is 0600 (owner read/write only) on unix.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::claims::IdTokenClaims;
use crate::error::{Error, Result};
use crate::token::TokenResponse;

/// Keys `StoredCredential` serializes itself; never carried over from `extra`.
const RECORD_FIELDS: [&str; 6] = [
    "access_token",
    "token_type",
    "id_token",
    "expires_in",
    "refresh_token",
    "expiry",
];

/// The persisted token record.
///
/// `refresh_token` is the only field that survives every refresh; the
/// rest mirror the latest token endpoint response. `expiry` is absolute
/// unix seconds, derived when the record is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredCredential {
    /// Build the record to persist after a refresh.
    ///
    /// `refresh_token` is the token sent in the request; it replaces
    /// whatever the response carried, since providers often omit it.
    pub fn from_response(response: TokenResponse, refresh_token: &str, now: i64) -> Result<Self> {
        let expiry = response.expiry(now)?;
        let mut extra = response.extra;
        for key in RECORD_FIELDS {
            extra.remove(key);
        }
        Ok(Self {
            access_token: response.access_token,
            token_type: response.token_type,
            id_token: response.id_token,
            expires_in: response.expires_in,
            refresh_token: refresh_token.to_owned(),
            expiry,
            extra,
        })
    }

    /// The cached ID token, if it can be used for `audience` at `now`.
    ///
    /// Returns `Ok(None)` when there is no ID token, the audience differs,
    /// or the token is expired. A non-empty ID token that does not decode
    /// is an error.
    pub fn reusable_id_token(&self, audience: &str, now: i64) -> Result<Option<&str>> {
        if self.id_token.is_empty() {
            return Ok(None);
        }
        let claims = IdTokenClaims::decode_unverified(&self.id_token)
            .map_err(|e| Error::CredentialParse(format!("cached id_token: {e}")))?;
        if claims.is_reusable_for(audience, now) {
            Ok(Some(self.id_token.as_str()))
        } else {
            debug!(
                audience_matches = claims.audience_matches(audience),
                exp = ?claims.exp,
                "cached id_token not reusable"
            );
            Ok(None)
        }
    }
}

/// Handle to the credential cache file.
#[derive(Debug, Clone)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a cache exists. No cache means the interactive flow runs.
    pub async fn exists(&self) -> Result<bool> {
        tokio::fs::try_exists(&self.path).await.map_err(|e| {
            Error::Io(format!(
                "checking credential file {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Read and decode the cache. Malformed JSON is an error, never an
    /// empty credential.
    pub async fn load(&self) -> Result<StoredCredential> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Io(format!(
                "reading credential file {}: {e}",
                self.path.display()
            ))
        })?;
        let credential: StoredCredential = serde_json::from_str(&contents).map_err(|e| {
            Error::CredentialParse(format!(
                "parsing credential file {}: {e}",
                self.path.display()
            ))
        })?;
        info!(path = %self.path.display(), "loaded cached credential");
        Ok(credential)
    }

    /// Replace the cache with `credential`.
    pub async fn save(&self, credential: &StoredCredential) -> Result<()> {
        write_atomic(&self.path, credential).await?;
        info!(path = %self.path.display(), expiry = ?credential.expiry, "saved credential");
        Ok(())
    }
}

/// Write to a sibling temp file created 0600, then rename over the
/// target. The temp file is removed if any step after its creation fails.
async fn write_atomic(path: &Path, credential: &StoredCredential) -> Result<()> {
    let json = serde_json::to_string_pretty(credential)
        .map_err(|e| Error::CredentialParse(format!("serializing credential: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;
    let tmp_path = dir.join(temp_file_name());

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options
        .open(&tmp_path)
        .await
        .map_err(|e| Error::Io(format!("creating temp credential file: {e}")))?;

    let written = async {
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| Error::Io(format!("syncing temp credential file: {e}")))?;
        drop(file);
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))
    }
    .await;

    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }

    debug!(path = %path.display(), "persisted credential");
    Ok(())
}

fn temp_file_name() -> String {
    format!(".creds.tmp.{}", std::process::id())
}
