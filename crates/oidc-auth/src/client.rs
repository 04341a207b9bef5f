//! OAuth client configuration from a client secrets file
//!
//! Accepts the JSON a provider console hands out for a desktop ("installed")
//! or web OAuth client:
//!
//! ```json
//! {"installed": {"client_id": "...", "client_secret": "...",
//!   "auth_uri": "https://...", "token_uri": "https://...",
//!   "redirect_uris": ["http://localhost"]}}
//! ```

use std::path::Path;

use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::constants::OOB_REDIRECT_URI;
use crate::error::{Error, Result};

/// Immutable OAuth client configuration, loaded once per process.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub auth_uri: String,
    pub token_uri: String,
    pub redirect_uri: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<RawClient>,
    web: Option<RawClient>,
}

#[derive(Deserialize)]
struct RawClient {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    auth_uri: String,
    #[serde(default)]
    token_uri: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl ClientConfig {
    /// Read and parse a client secrets file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(format!(
                "reading client secrets file {}: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_json(&contents)?;
        debug!(path = %path.display(), client_id = %config.client_id, "loaded client secrets");
        Ok(config)
    }

    /// Parse client secrets JSON. `installed` wins over `web` when both exist.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SecretsFile = serde_json::from_str(json)
            .map_err(|e| Error::ClientSecrets(format!("parsing client secrets: {e}")))?;
        let raw = file.installed.or(file.web).ok_or_else(|| {
            Error::ClientSecrets("no \"installed\" or \"web\" client found".into())
        })?;

        if raw.client_id.trim().is_empty() {
            return Err(Error::ClientSecrets("client_id must be set".into()));
        }
        require_http_url("auth_uri", &raw.auth_uri)?;
        require_http_url("token_uri", &raw.token_uri)?;

        let redirect_uri = raw
            .redirect_uris
            .into_iter()
            .find(|u| !u.is_empty())
            .unwrap_or_else(|| OOB_REDIRECT_URI.to_owned());

        Ok(Self {
            client_id: raw.client_id,
            client_secret: Secret::new(raw.client_secret),
            auth_uri: raw.auth_uri,
            token_uri: raw.token_uri,
            redirect_uri,
        })
    }
}

fn require_http_url(field: &str, value: &str) -> Result<()> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(Error::ClientSecrets(format!(
            "{field} must start with http:// or https://, got: {value:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed_json() -> &'static str {
        r#"{
  "installed": {
    "client_id": "1071284184436-abc.apps.googleusercontent.com",
    "project_id": "demo",
    "auth_uri": "https://accounts.google.com/o/oauth2/auth",
    "token_uri": "https://oauth2.googleapis.com/token",
    "client_secret": "GOCSPX-secret",
    "redirect_uris": ["http://localhost"]
  }
}"#
    }

    #[test]
    fn parses_installed_client() {
        let config = ClientConfig::from_json(installed_json()).unwrap();
        assert_eq!(config.client_id, "1071284184436-abc.apps.googleusercontent.com");
        assert_eq!(config.client_secret.expose(), "GOCSPX-secret");
        assert_eq!(config.auth_uri, "https://accounts.google.com/o/oauth2/auth");
        assert_eq!(config.token_uri, "https://oauth2.googleapis.com/token");
        assert_eq!(config.redirect_uri, "http://localhost");
    }

    #[test]
    fn parses_web_client_when_installed_missing() {
        let json = r#"{"web": {"client_id": "web-id", "client_secret": "s",
            "auth_uri": "https://example.com/auth", "token_uri": "https://example.com/token",
            "redirect_uris": ["https://example.com/cb"]}}"#;
        let config = ClientConfig::from_json(json).unwrap();
        assert_eq!(config.client_id, "web-id");
        assert_eq!(config.redirect_uri, "https://example.com/cb");
    }

    #[test]
    fn missing_redirect_uris_falls_back_to_oob() {
        let json = r#"{"installed": {"client_id": "id", "client_secret": "s",
            "auth_uri": "https://example.com/auth", "token_uri": "https://example.com/token"}}"#;
        let config = ClientConfig::from_json(json).unwrap();
        assert_eq!(config.redirect_uri, OOB_REDIRECT_URI);
    }

    #[test]
    fn rejects_file_without_client_section() {
        let err = ClientConfig::from_json(r#"{"service_account": {}}"#).unwrap_err();
        assert!(matches!(err, Error::ClientSecrets(_)), "got: {err:?}");
    }

    #[test]
    fn rejects_invalid_json() {
        let err = ClientConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::ClientSecrets(_)), "got: {err:?}");
    }

    #[test]
    fn rejects_non_http_token_uri() {
        let json = r#"{"installed": {"client_id": "id", "client_secret": "s",
            "auth_uri": "https://example.com/auth", "token_uri": "ftp://example.com/token"}}"#;
        let err = ClientConfig::from_json(json).unwrap_err();
        assert!(err.to_string().contains("token_uri"), "got: {err}");
    }

    #[test]
    fn rejects_empty_client_id() {
        let json = r#"{"installed": {"client_id": "",
            "auth_uri": "https://a", "token_uri": "https://t"}}"#;
        assert!(ClientConfig::from_json(json).is_err());
    }

    #[test]
    fn debug_redacts_client_secret() {
        let config = ClientConfig::from_json(installed_json()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("GOCSPX-secret"), "secret leaked: {debug}");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ClientConfig::load(Path::new("/nonexistent/client_secret.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got: {err:?}");
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_secret.json");
        std::fs::write(&path, installed_json()).unwrap();
        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.token_uri, "https://oauth2.googleapis.com/token");
    }
}
