//! Error types for OIDC token operations

/// Errors from client-secret loading, token endpoint calls, ID-token
/// decoding and credential file access.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid id_token: {0}")]
    InvalidIdToken(String),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("invalid client secrets: {0}")]
    ClientSecrets(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
