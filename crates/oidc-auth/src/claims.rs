//! Unverified ID-token claim decoding
//!
//! The cached ID token was written by this tool after a TLS exchange with
//! the provider, so its signature is not checked here. Only the claim
//! segment is decoded to decide whether the token can be reused.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::error::{Error, Result};

/// `aud` is a string or an array of strings (OIDC Core 2).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

/// Registered claims read from an ID token. Timestamps are unix seconds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
struct Header {
    #[serde(default)]
    alg: String,
}

impl IdTokenClaims {
    /// Decode header and claims of a compact JWS without checking the
    /// signature. Requires three segments, a header naming an `alg`, and a
    /// JSON object claim set.
    pub fn decode_unverified(token: &str) -> Result<Self> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(Error::InvalidIdToken(format!(
                "expected 3 dot-separated segments, got {}",
                segments.len()
            )));
        }

        let header: Header = serde_json::from_slice(&decode_segment(segments[0], "header")?)
            .map_err(|e| Error::InvalidIdToken(format!("header is not valid JSON: {e}")))?;
        if header.alg.is_empty() {
            return Err(Error::InvalidIdToken("header has no alg".into()));
        }

        serde_json::from_slice(&decode_segment(segments[1], "claims")?)
            .map_err(|e| Error::InvalidIdToken(format!("claims are not valid JSON: {e}")))
    }

    /// True when `aud` is exactly `audience`. A multi-valued `aud` matches
    /// only if it names that single audience.
    pub fn audience_matches(&self, audience: &str) -> bool {
        match &self.aud {
            Some(Audience::Single(aud)) => aud == audience,
            Some(Audience::Multiple(auds)) => auds.len() == 1 && auds[0] == audience,
            None => false,
        }
    }

    /// Time-based validity at `now`: not expired, not issued or activated
    /// in the future. Absent claims are not checked.
    pub fn validate(&self, now: i64) -> Result<()> {
        if let Some(exp) = self.exp.filter(|&exp| now > exp) {
            return Err(Error::InvalidIdToken(format!(
                "token is expired by {}s",
                now - exp
            )));
        }
        if self.iat.is_some_and(|iat| now < iat) {
            return Err(Error::InvalidIdToken("token used before issued".into()));
        }
        if self.nbf.is_some_and(|nbf| now < nbf) {
            return Err(Error::InvalidIdToken("token is not valid yet".into()));
        }
        Ok(())
    }

    /// Reuse check for a cached token: audience match plus `validate`.
    pub fn is_reusable_for(&self, audience: &str, now: i64) -> bool {
        self.audience_matches(audience) && self.validate(now).is_ok()
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| Error::InvalidIdToken(format!("{name} segment is not base64url: {e}")))
}

/// Current wall-clock time as unix seconds.
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Build an unsigned compact JWS for tests.
#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const AUD: &str = "1071284184436-vu96.apps.googleusercontent.com";

    #[test]
    fn decodes_registered_claims() {
        let token = encode_test_token(&json!({
            "aud": AUD, "exp": 2_000_000_000, "iat": 1_999_996_400,
            "iss": "https://accounts.google.com", "sub": "1234", "email": "a@example.com"
        }));
        let claims = IdTokenClaims::decode_unverified(&token).unwrap();
        assert_eq!(claims.aud, Some(Audience::Single(AUD.into())));
        assert_eq!(claims.exp, Some(2_000_000_000));
        assert_eq!(claims.iat, Some(1_999_996_400));
        assert_eq!(claims.iss.as_deref(), Some("https://accounts.google.com"));
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn accepts_padded_segments() {
        let token = encode_test_token(&json!({"aud": "x"}));
        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        while parts[1].len() % 4 != 0 {
            parts[1].push('=');
        }
        let claims = IdTokenClaims::decode_unverified(&parts.join(".")).unwrap();
        assert!(claims.audience_matches("x"));
    }

    #[test]
    fn rejects_wrong_segment_count() {
        let err = IdTokenClaims::decode_unverified("abc.def").unwrap_err();
        assert!(err.to_string().contains("3 dot-separated segments"), "got: {err}");
        assert!(IdTokenClaims::decode_unverified("").is_err());
    }

    #[test]
    fn rejects_non_base64_claims() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let err = IdTokenClaims::decode_unverified(&format!("{header}.!!!.sig")).unwrap_err();
        assert!(matches!(err, Error::InvalidIdToken(_)));
    }

    #[test]
    fn rejects_header_without_alg() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"aud":"x"}"#);
        let err = IdTokenClaims::decode_unverified(&format!("{header}.{payload}.sig")).unwrap_err();
        assert!(err.to_string().contains("alg"), "got: {err}");
    }

    #[test]
    fn rejects_claims_that_are_not_an_object() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(b"[1,2]");
        assert!(IdTokenClaims::decode_unverified(&format!("{header}.{payload}.sig")).is_err());
    }

    #[test]
    fn audience_must_match_exactly() {
        let claims = IdTokenClaims {
            aud: Some(Audience::Single(AUD.into())),
            ..Default::default()
        };
        assert!(claims.audience_matches(AUD));
        assert!(!claims.audience_matches("other"));
        assert!(!claims.audience_matches(&AUD[..10]));
        assert!(!IdTokenClaims::default().audience_matches(AUD));
    }

    #[test]
    fn multi_valued_audience_matches_only_single_entry() {
        let one = IdTokenClaims {
            aud: Some(Audience::Multiple(vec![AUD.into()])),
            ..Default::default()
        };
        assert!(one.audience_matches(AUD));

        let two = IdTokenClaims {
            aud: Some(Audience::Multiple(vec![AUD.into(), "other".into()])),
            ..Default::default()
        };
        assert!(!two.audience_matches(AUD));
    }

    #[test]
    fn validate_checks_expiry_boundary() {
        let claims = IdTokenClaims {
            exp: Some(1_000),
            ..Default::default()
        };
        assert!(claims.validate(999).is_ok());
        assert!(claims.validate(1_000).is_ok());
        let err = claims.validate(1_001).unwrap_err();
        assert!(err.to_string().contains("expired"), "got: {err}");
    }

    #[test]
    fn validate_rejects_future_iat_and_nbf() {
        let iat = IdTokenClaims {
            iat: Some(2_000),
            ..Default::default()
        };
        assert!(iat.validate(1_000).is_err());

        let nbf = IdTokenClaims {
            nbf: Some(2_000),
            ..Default::default()
        };
        assert!(nbf.validate(1_000).is_err());
        assert!(nbf.validate(2_000).is_ok());
    }

    #[test]
    fn reusable_requires_audience_and_validity() {
        let claims = IdTokenClaims {
            aud: Some(Audience::Single(AUD.into())),
            exp: Some(5_000),
            ..Default::default()
        };
        assert!(claims.is_reusable_for(AUD, 4_000));
        assert!(!claims.is_reusable_for(AUD, 6_000));
        assert!(!claims.is_reusable_for("other", 4_000));
    }
}
