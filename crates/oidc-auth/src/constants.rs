//! OAuth/OIDC constants
//!
//! Provider-specific values (client ID, endpoints) come from the client
//! secrets file. These are the fixed values the tool adds on top.

/// Scope requested during the one-time authorization-code flow.
pub const USERINFO_EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";

/// Redirect used when the client secrets file lists no `redirect_uris`.
/// The provider shows the code on a page for the user to copy.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// `state` value sent with the authorization request. The code is pasted
/// back by hand, so there is no callback to compare it against.
pub const AUTHORIZATION_STATE: &str = "code";

/// Upper bound on any token endpoint response body we buffer (1 MiB).
pub const MAX_RESPONSE_BYTES: usize = 1 << 20;

/// Default credential cache location, relative to the working directory.
pub const DEFAULT_CREDENTIAL_FILE: &str = "creds.json";
