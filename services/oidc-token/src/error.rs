//! Top-level error type and exit-code mapping

use thiserror::Error;

/// Every way a run can fail. `main` turns these into an exit code.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] common::Error),

    #[error(transparent)]
    Auth(#[from] oidc_auth::Error),

    #[error("authorization code prompt failed: {0}")]
    Prompt(String),
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_IO: u8 = 3;
pub const EXIT_NETWORK: u8 = 4;
pub const EXIT_PARSE: u8 = 5;

impl Error {
    /// Process exit code for this failure. 2 matches clap's usage errors.
    pub fn exit_code(&self) -> u8 {
        use oidc_auth::Error as Auth;
        match self {
            Error::Config(_) => EXIT_CONFIG,
            Error::Prompt(_) => EXIT_IO,
            Error::Auth(err) => match err {
                Auth::ClientSecrets(_) => EXIT_CONFIG,
                Auth::Io(_) => EXIT_IO,
                Auth::Http(_) | Auth::TokenExchange(_) | Auth::InvalidCredentials(_) => {
                    EXIT_NETWORK
                }
                Auth::InvalidIdToken(_) | Auth::CredentialParse(_) => EXIT_PARSE,
            },
        }
    }
}
