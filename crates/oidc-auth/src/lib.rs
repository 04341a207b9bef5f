//! OIDC ID-token acquisition library
//!
//! Loads an OAuth client from a client secrets file, runs the one-time
//! authorization-code exchange, refreshes ID tokens for an audience, and
//! keeps the result in a local credential file.
//!
//! Credential flow:
//! 1. `ClientConfig::load()` reads the client secrets file
//! 2. First run: `pkce::build_authorization_url()`, then `token::exchange_code()`
//!    with the pasted code to obtain a refresh token
//! 3. Later runs: `CredentialFile::load()` and
//!    `StoredCredential::reusable_id_token()` short-circuit while the cached
//!    ID token is valid for the audience
//! 4. Otherwise `token::refresh_id_token()` and `CredentialFile::save()`

pub mod claims;
pub mod client;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod pkce;
pub mod token;

pub use claims::{Audience, IdTokenClaims, unix_now};
pub use client::ClientConfig;
pub use constants::*;
pub use credentials::{CredentialFile, StoredCredential};
pub use error::{Error, Result};
pub use pkce::{Pkce, build_authorization_url};
pub use token::{TokenResponse, exchange_code, refresh_id_token};
